use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use super::checks::{is_host_init, pid1_start_seconds, seconds_since};
use super::{Result, UptimePolicy, UptimeStrategy};
use crate::fsutil;

/// Computes the container's effective uptime.
#[derive(Debug, Clone)]
pub struct UptimeResolver {
    proc_root: PathBuf,
    started: Instant,
}

impl UptimeResolver {
    /// Creates a resolver; the process uptime is measured from this call.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        UptimeResolver {
            proc_root: proc_root.into(),
            started: Instant::now(),
        }
    }

    /// Picks the strategy for `policy`.
    ///
    /// For [`UptimePolicy::Auto`], PID 1 sitting in a root-level cgroup is taken to be the
    /// host's init, in which case its start time says nothing about the container and the
    /// process strategy is used. An unreadable membership record selects PID 1.
    pub async fn strategy(&self, policy: UptimePolicy) -> UptimeStrategy {
        match policy {
            UptimePolicy::Process => UptimeStrategy::Process,
            UptimePolicy::Pid1 => UptimeStrategy::Pid1,
            UptimePolicy::Auto => {
                match fsutil::read_to_string(self.proc_root.join("1/cgroup")).await {
                    Ok(membership) if is_host_init(&membership) => UptimeStrategy::Process,
                    Ok(_) => UptimeStrategy::Pid1,
                    Err(err) => {
                        log::debug!("{err}");
                        UptimeStrategy::Pid1
                    }
                }
            }
        }
    }

    /// Uptime in seconds according to `policy`. Never fails and never negative.
    pub async fn resolve_uptime_seconds(&self, policy: UptimePolicy) -> f64 {
        self.resolve_at(policy, SystemTime::now()).await
    }

    pub async fn resolve_at(&self, policy: UptimePolicy, now: SystemTime) -> f64 {
        match self.strategy(policy).await {
            UptimeStrategy::Process => self.process_uptime(),
            UptimeStrategy::Pid1 => match self.pid1_uptime(now).await {
                Ok(uptime) => uptime,
                Err(err) => {
                    log::debug!("PID 1 uptime unavailable, using process uptime: {err}");
                    self.process_uptime()
                }
            },
        }
    }

    fn process_uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    async fn pid1_uptime(&self, now: SystemTime) -> Result<f64> {
        let (pid1_stat, kernel_stat) = tokio::join!(
            fsutil::read_to_string(self.proc_root.join("1/stat")),
            fsutil::read_to_string(self.proc_root.join("stat")),
        );
        let start = pid1_start_seconds(&pid1_stat?, &kernel_stat?)?;
        Ok(seconds_since(start, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};

    const PID1_STAT: &str =
        "1 (tini) S 0 1 1 0 -1 4194560 100 0 0 0 0 0 0 0 20 0 1 0 1000 12345 67\n";

    fn proc_tree(pid1_cgroup: Option<&str>, pid1_stat: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("1")).unwrap();
        if let Some(cgroup) = pid1_cgroup {
            fs::write(dir.path().join("1/cgroup"), cgroup).unwrap();
        }
        fs::write(dir.path().join("1/stat"), pid1_stat).unwrap();
        fs::write(dir.path().join("stat"), "cpu  1 2 3 4\nbtime 1700000000\n").unwrap();
        dir
    }

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_110)
    }

    #[tokio::test]
    async fn test_pid1_policy() {
        let dir = proc_tree(None, PID1_STAT);
        let resolver = UptimeResolver::new(dir.path());
        assert_eq!(resolver.resolve_at(UptimePolicy::Pid1, now()).await, 100.0);
    }

    #[tokio::test]
    async fn test_auto_in_container_uses_pid1() {
        let dir = proc_tree(Some("0::/kubepods/pod1/abc\n"), PID1_STAT);
        let resolver = UptimeResolver::new(dir.path());
        assert_eq!(resolver.strategy(UptimePolicy::Auto).await, UptimeStrategy::Pid1);
        assert_eq!(resolver.resolve_at(UptimePolicy::Auto, now()).await, 100.0);
    }

    #[tokio::test]
    async fn test_auto_on_host_init_uses_process() {
        let dir = proc_tree(Some("0::/init.scope\n"), PID1_STAT);
        let resolver = UptimeResolver::new(dir.path());
        assert_eq!(resolver.strategy(UptimePolicy::Auto).await, UptimeStrategy::Process);
        let uptime = resolver.resolve_at(UptimePolicy::Auto, now()).await;
        assert!((0.0..5.0).contains(&uptime), "process uptime was {uptime}");
    }

    #[tokio::test]
    async fn test_auto_without_membership_record_uses_pid1() {
        let dir = proc_tree(None, PID1_STAT);
        let resolver = UptimeResolver::new(dir.path());
        assert_eq!(resolver.strategy(UptimePolicy::Auto).await, UptimeStrategy::Pid1);
    }

    #[tokio::test]
    async fn test_malformed_pid1_record_falls_back_to_process() {
        let dir = proc_tree(None, "garbage");
        let resolver = UptimeResolver::new(dir.path());
        let uptime = resolver.resolve_at(UptimePolicy::Pid1, now()).await;
        assert!((0.0..5.0).contains(&uptime), "process uptime was {uptime}");
    }

    #[tokio::test]
    async fn test_pid1_started_in_future_clamps_to_zero() {
        let dir = proc_tree(None, PID1_STAT);
        let resolver = UptimeResolver::new(dir.path());
        let before_boot = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        assert_eq!(resolver.resolve_at(UptimePolicy::Pid1, before_boot).await, 0.0);
    }
}
