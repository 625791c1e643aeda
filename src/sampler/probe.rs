use std::path::PathBuf;
use std::sync::OnceLock;

use crate::cgroup::{self, CgroupDescriptor, CgroupReading, CgroupResolver};
use crate::error::ResultOkLogExt;
use crate::fsutil;
use crate::host::{self, ConnectionCounts, HostFacts, SystemPaths};
use crate::stats::{KeyValueStat, LoadAverage, MemInfo, NetDev, ProcStat, SingleLineStat};
use crate::uptime::{UptimePolicy, UptimeResolver};

use super::disk::disk_usage;
use super::limits::{LimitFallback, memory_usage};
use super::procs::{ProcessCounts, SCAN_WORKERS, scan_processes};
use super::{Identity, Usage};

/// Sources and policies used by the [`Probe`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub paths: SystemPaths,
    /// Mount path whose filesystem is reported as disk usage.
    pub disk_path: PathBuf,
    pub uptime_policy: UptimePolicy,
    pub limit_fallback: LimitFallback,
    /// Leave `lo` out of the network totals.
    pub exclude_loopback: bool,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub scan_workers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            paths: SystemPaths::default(),
            disk_path: PathBuf::from("/"),
            uptime_policy: UptimePolicy::default(),
            limit_fallback: LimitFallback::default(),
            exclude_loopback: true,
            ipv4: None,
            ipv6: None,
            scan_workers: SCAN_WORKERS,
        }
    }
}

/// Everything read from the system for one sample, before any derivation.
#[derive(Debug, Clone)]
pub struct RawReading {
    pub host: HostFacts,
    pub meminfo: Option<MemInfo>,
    pub proc_stat: Option<ProcStat>,
    pub cgroup: CgroupReading,
    pub load: Option<LoadAverage>,
    pub disk: Option<Usage>,
    pub net: Option<NetDev>,
    pub connections: ConnectionCounts,
    pub processes: ProcessCounts,
    pub uptime_seconds: f64,
}

/// Stateless access to every metric source.
///
/// The probe holds no rate state, so the streaming and identity schedules can share one
/// instance. The cgroup descriptor is resolved on first use and kept for the lifetime of
/// the probe.
#[derive(Debug)]
pub struct Probe {
    config: ProbeConfig,
    descriptor: OnceLock<CgroupDescriptor>,
    uptime: UptimeResolver,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        Probe {
            uptime: UptimeResolver::new(config.paths.proc_root.clone()),
            descriptor: OnceLock::new(),
            config,
        }
    }

    /// Creates a probe with an already resolved descriptor.
    pub fn with_descriptor(config: ProbeConfig, descriptor: CgroupDescriptor) -> Self {
        let probe = Probe::new(config);
        let _ = probe.descriptor.set(descriptor);
        probe
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &CgroupDescriptor {
        self.descriptor.get_or_init(|| {
            let paths = &self.config.paths;
            CgroupResolver::new(&paths.cgroup_root, &paths.proc_root).resolve()
        })
    }

    /// Reads every source concurrently. Failures leave the corresponding field empty.
    pub async fn read(&self) -> RawReading {
        let descriptor = self.descriptor();
        let paths = &self.config.paths;
        let proc_root = &paths.proc_root;

        let (host, meminfo, proc_stat, cgroup, load, disk, net, connections, processes, uptime) = tokio::join!(
            host::gather(paths),
            fsutil::read_parsed(proc_root.join("meminfo"), MemInfo::parse_str),
            fsutil::read_parsed(proc_root.join("stat"), ProcStat::parse_str),
            cgroup::read(descriptor),
            fsutil::read_parsed(proc_root.join("loadavg"), LoadAverage::parse_str),
            self.disk(),
            fsutil::read_parsed(proc_root.join("net/dev"), NetDev::parse_str),
            host::count_connections(proc_root),
            scan_processes(proc_root, self.config.scan_workers),
            self.uptime.resolve_uptime_seconds(self.config.uptime_policy),
        );

        RawReading {
            host,
            meminfo,
            proc_stat,
            cgroup,
            load,
            disk,
            net,
            connections,
            processes,
            uptime_seconds: uptime,
        }
    }

    /// Gathers the identity subset. Touches no rate state.
    pub async fn basic_info(&self) -> Identity {
        let descriptor = self.descriptor();
        let paths = &self.config.paths;

        let (host, meminfo, cgroup, disk, (ipv4, ipv6)) = tokio::join!(
            host::gather(paths),
            fsutil::read_parsed(paths.proc_root.join("meminfo"), MemInfo::parse_str),
            cgroup::read(descriptor),
            self.disk(),
            self.addresses(),
        );
        let (memory, swap) = memory_usage(&cgroup, meminfo.as_ref(), self.config.limit_fallback);

        Identity {
            host,
            mem_total: memory.total,
            swap_total: swap.total,
            disk_total: disk.map(|d| d.total).unwrap_or(0),
            ipv4,
            ipv6,
        }
    }

    async fn disk(&self) -> Option<Usage> {
        disk_usage(&self.config.disk_path)
            .await
            .ok_log(log::Level::Debug)
    }

    async fn addresses(&self) -> (String, String) {
        if let (Some(v4), Some(v6)) = (&self.config.ipv4, &self.config.ipv6) {
            return (v4.clone(), v6.clone());
        }
        let (v4, v6) = host::detect_addresses().await;
        (
            self.config.ipv4.clone().unwrap_or(v4),
            self.config.ipv6.clone().unwrap_or(v6),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::{CgroupFile, CgroupMode};
    use std::fs;

    #[tokio::test]
    async fn test_injected_descriptor_is_used() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("memory.max"), "max\n").unwrap();
        fs::write(
            dir.path().join("meminfo"),
            "MemTotal: 1000 kB\nMemAvailable: 500 kB\nSwapTotal: 0 kB\n",
        )
        .unwrap();

        let descriptor = CgroupDescriptor::builder(CgroupMode::V2)
            .set_path(CgroupFile::MemoryLimit, dir.path().join("memory.max"))
            .build();
        let config = ProbeConfig {
            paths: SystemPaths {
                proc_root: dir.path().to_path_buf(),
                cgroup_root: dir.path().join("cgroup"),
                os_release: dir.path().join("os-release"),
            },
            disk_path: dir.path().to_path_buf(),
            ipv4: Some("192.0.2.1".to_owned()),
            ipv6: Some(String::new()),
            ..Default::default()
        };
        let probe = Probe::with_descriptor(config.clone(), descriptor.clone());
        assert_eq!(probe.descriptor(), &descriptor);

        let info = probe.basic_info().await;
        assert_eq!(info.mem_total, 1000 * 1024);
        assert_eq!(info.ipv4, "192.0.2.1");
        assert_eq!(info.ipv6, "");

        let zero = Probe::with_descriptor(
            ProbeConfig {
                limit_fallback: LimitFallback::Zero,
                ..config
            },
            descriptor,
        );
        assert_eq!(zero.basic_info().await.mem_total, 0);
    }

    #[test]
    fn test_descriptor_resolved_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProbeConfig {
            paths: SystemPaths {
                proc_root: dir.path().join("proc"),
                cgroup_root: dir.path().join("cgroup"),
                os_release: dir.path().join("os-release"),
            },
            ..Default::default()
        };
        let probe = Probe::new(config);
        assert_eq!(probe.descriptor().mode(), CgroupMode::Unavailable);

        // a v2 marker appearing later does not change the resolved mode
        fs::create_dir_all(dir.path().join("cgroup")).unwrap();
        fs::write(dir.path().join("cgroup/cgroup.controllers"), "cpu\n").unwrap();
        assert_eq!(probe.descriptor().mode(), CgroupMode::Unavailable);
    }
}
