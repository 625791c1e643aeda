//! JSON documents sent to the collector.

use serde::Serialize;

use crate::sampler::{Identity, Snapshot, Usage};

/// Upper bound of the reported CPU percentage. Bursting containers can briefly exceed their
/// quota by a wide margin; the collector's gauge only accepts three digits.
pub const MAX_CPU_PERCENT: f64 = 999.0;

/// Identity document for `uploadBasicInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicInfo {
    pub arch: String,
    pub cpu_cores: usize,
    pub cpu_name: String,
    pub disk_total: u64,
    pub ipv4: String,
    pub ipv6: String,
    pub mem_total: u64,
    pub swap_total: u64,
    pub os: String,
    pub kernel_version: String,
    pub version: String,
    pub virtualization: &'static str,
}

impl From<Identity> for BasicInfo {
    fn from(identity: Identity) -> Self {
        BasicInfo {
            arch: identity.host.arch,
            cpu_cores: identity.host.cpu_cores,
            cpu_name: identity.host.cpu_name,
            disk_total: identity.disk_total,
            ipv4: identity.ipv4,
            ipv6: identity.ipv6,
            mem_total: identity.mem_total,
            swap_total: identity.swap_total,
            os: identity.host.os,
            kernel_version: identity.host.kernel_version,
            version: env!("CARGO_PKG_VERSION").to_owned(),
            virtualization: "container",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuReport {
    pub usage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub total: u64,
    pub used: u64,
}

impl From<Usage> for Capacity {
    fn from(usage: Usage) -> Self {
        Capacity {
            total: usage.total,
            used: usage.used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadReport {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReport {
    /// Transmit rate in bytes per second.
    pub up: u64,
    /// Receive rate in bytes per second.
    pub down: u64,
    pub total_up: u64,
    pub total_down: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionsReport {
    pub tcp: u64,
    pub udp: u64,
}

/// One streamed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub cpu: CpuReport,
    pub ram: Capacity,
    pub swap: Capacity,
    pub load: LoadReport,
    pub disk: Capacity,
    pub network: NetworkReport,
    pub connections: ConnectionsReport,
    pub uptime: u64,
    pub process: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Clamps a CPU percentage into `[0, MAX_CPU_PERCENT]`; NaN becomes 0.
pub fn clamp_cpu_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, MAX_CPU_PERCENT)
}

/// Floors a rate to whole bytes per second; missing or negative rates become 0.
fn whole_rate(rate: Option<f64>) -> u64 {
    rate.filter(|r| r.is_finite() && *r > 0.0)
        .map(|r| r.floor() as u64)
        .unwrap_or(0)
}

impl Report {
    /// Converts a snapshot into the wire format.
    ///
    /// CPU usage is reported against the container's limit when one is known, otherwise
    /// against the host's capacity.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let cpu = snapshot
            .cpu
            .percent_of_limit
            .or(snapshot.cpu.percent_of_host)
            .unwrap_or(0.0);

        Report {
            cpu: CpuReport {
                usage: clamp_cpu_percent(cpu),
            },
            ram: snapshot.memory.into(),
            swap: snapshot.swap.into(),
            load: LoadReport {
                load1: snapshot.load.load1,
                load5: snapshot.load.load5,
                load15: snapshot.load.load15,
            },
            disk: snapshot.disk.into(),
            network: NetworkReport {
                up: whole_rate(snapshot.network.tx_per_sec),
                down: whole_rate(snapshot.network.rx_per_sec),
                total_up: snapshot.network.total_tx,
                total_down: snapshot.network.total_rx,
            },
            connections: ConnectionsReport {
                tcp: snapshot.connections.tcp,
                udp: snapshot.connections.udp,
            },
            uptime: snapshot.uptime_seconds.max(0.0).floor() as u64,
            process: snapshot.processes.processes,
            message: None,
        }
    }
}
