use std::time::{SystemTime, UNIX_EPOCH};

use super::{Error, Result};
use crate::cgroup::{Membership, parse_memberships};
use crate::stats::{ProcStat, USER_HZ, parse_start_ticks};

/// Returns true if PID 1's cgroup membership only names root-level paths.
///
/// The host's init lives in `/` (or `/init.scope` under systemd). A PID 1 placed anywhere
/// else belongs to a container with its own process namespace.
///
/// # Arguments
///
/// * `pid1_membership` - Contents of `/proc/1/cgroup`.
pub fn is_host_init(pid1_membership: &str) -> bool {
    let memberships = parse_memberships(pid1_membership);
    !memberships.is_empty() && memberships.iter().all(Membership::is_root_level)
}

/// Start time of PID 1 in seconds since the UNIX epoch.
///
/// # Arguments
///
/// * `pid1_stat` - Contents of `/proc/1/stat`.
/// * `kernel_stat` - Contents of `/proc/stat`, which carries the boot time.
///
/// # Errors
///
/// Returns an error if the start ticks or the boot time cannot be parsed.
pub fn pid1_start_seconds(pid1_stat: &str, kernel_stat: &str) -> Result<f64> {
    let ticks = parse_start_ticks(pid1_stat)?;
    let boot_time = ProcStat::parse_str(kernel_stat)
        .map_err(Error::KernelStat)?
        .boot_time
        .ok_or(Error::MissingBootTime)?;

    Ok(boot_time as f64 + ticks as f64 / USER_HZ as f64)
}

/// Seconds elapsed from `start` (seconds since the UNIX epoch) to `now`, never negative.
pub fn seconds_since(start: f64, now: SystemTime) -> f64 {
    let now = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    (now - start).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const PID1_STAT: &str =
        "1 (my init) S 0 1 1 0 -1 4194560 100 0 0 0 0 0 0 0 20 0 1 0 1000 12345 67\n";

    #[test]
    fn test_host_init_detection() {
        assert!(is_host_init("0::/init.scope\n"));
        assert!(is_host_init("12:memory:/\n1:name=systemd:/init.scope\n0::/\n"));
        assert!(!is_host_init("0::/system.slice/docker-abc.scope\n"));
        assert!(!is_host_init("12:memory:/\n4:cpu:/kubepods/pod1\n"));
        assert!(!is_host_init(""));
    }

    #[test]
    fn test_pid1_start_seconds() {
        let start = pid1_start_seconds(PID1_STAT, "cpu  1 2 3 4\nbtime 1700000000\n").unwrap();
        assert_eq!(start, 1_700_000_010.0);
    }

    #[test]
    fn test_pid1_start_missing_boot_time() {
        let err = pid1_start_seconds(PID1_STAT, "cpu  1 2 3 4\n").unwrap_err();
        assert!(matches!(err, Error::MissingBootTime));
    }

    #[test]
    fn test_pid1_start_truncated_record() {
        let err = pid1_start_seconds("1 (init) S 0", "btime 1\n").unwrap_err();
        assert!(matches!(err, Error::Record(_)));
    }

    #[test]
    fn test_seconds_since_is_clamped() {
        let now = UNIX_EPOCH + Duration::from_secs(100);
        assert_eq!(seconds_since(40.0, now), 60.0);
        assert_eq!(seconds_since(500.0, now), 0.0);
    }
}
