use std::time::SystemTime;

use crate::cgroup::CgroupMode;
use crate::host::{ConnectionCounts, HostFacts};
use crate::stats::{InterfaceCounters, LoadAverage};

use super::ProcessCounts;

/// Capacity and consumption of one resource, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub total: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuSnapshot {
    /// Cumulative CPU seconds, from the cgroup when it exposes a usage file, else the host.
    pub cumulative_seconds: Option<f64>,
    /// Effective limit after the fallback policy has been applied.
    pub limit_cores: f64,
    pub percent_of_limit: Option<f64>,
    pub percent_of_host: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSnapshot {
    pub total_rx: u64,
    pub total_tx: u64,
    pub rx_per_sec: Option<f64>,
    pub tx_per_sec: Option<f64>,
    pub interfaces: Vec<InterfaceCounters>,
}

/// One immutable sample of the container and its host.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub taken_at: SystemTime,
    pub host: HostFacts,
    pub cgroup_mode: CgroupMode,
    pub cpu: CpuSnapshot,
    pub memory: Usage,
    pub swap: Usage,
    pub disk: Usage,
    pub load: LoadAverage,
    pub network: NetworkSnapshot,
    pub connections: ConnectionCounts,
    pub processes: ProcessCounts,
    pub uptime_seconds: f64,
}

/// The slowly changing subset of a snapshot reported on the identity schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub host: HostFacts,
    pub mem_total: u64,
    pub swap_total: u64,
    pub disk_total: u64,
    pub ipv4: String,
    pub ipv6: String,
}
