//! Snapshot assembly.
//!
//! [`Probe`] reads every source concurrently and holds no state besides the lazily resolved
//! cgroup descriptor. [`MetricsSampler`] owns the only mutable cross-sample state, the
//! previous [`RateState`], and folds each [`RawReading`] into an immutable [`Snapshot`].
//!
//! Individual source failures never abort a sample; the affected fields are left empty or
//! zero.
mod disk;
mod limits;
mod probe;
mod procs;
mod rate;
mod snapshot;

use std::sync::Arc;
use std::time::{Instant, SystemTime};

pub use disk::{DF_TIMEOUT, DiskError, disk_usage, parse_df_output};
pub use limits::{LimitFallback, UnknownFallback, memory_usage};
pub use probe::{Probe, ProbeConfig, RawReading};
pub use procs::{ProcessCounts, SCAN_WORKERS, scan_processes};
pub use rate::{RateState, Rates, compute};
pub use snapshot::{CpuSnapshot, Identity, NetworkSnapshot, Snapshot, Usage};

use crate::cgroup::CgroupFile;
use crate::stats::CpuTicks;

/// Produces snapshots with rates relative to the previous call.
#[derive(Debug)]
pub struct MetricsSampler {
    probe: Arc<Probe>,
    previous: Option<RateState>,
}

impl MetricsSampler {
    pub fn new(probe: Arc<Probe>) -> Self {
        MetricsSampler {
            probe,
            previous: None,
        }
    }

    pub fn probe(&self) -> &Arc<Probe> {
        &self.probe
    }

    /// Samples all sources and derives rates against the previous sample.
    pub async fn snapshot(&mut self) -> Snapshot {
        self.snapshot_at(SystemTime::now()).await
    }

    /// Like [`MetricsSampler::snapshot`], with the sample time supplied by the caller.
    pub async fn snapshot_at(&mut self, now: SystemTime) -> Snapshot {
        let started = Instant::now();
        let reading = self.probe.read().await;
        let config = self.probe.config();

        let host_cores = reading.host.cpu_cores as f64;
        let fallback = config.limit_fallback;
        let (memory, swap) = memory_usage(&reading.cgroup, reading.meminfo.as_ref(), fallback);
        let limit_cores = fallback.cores(reading.cgroup.cpu_limit_cores, host_cores);
        // Source fixed per descriptor: consecutive samples always difference the same counter.
        let cpu_seconds = match self.probe.descriptor().path(CgroupFile::CpuUsage) {
            Some(_) => reading.cgroup.cpu_seconds,
            None => reading
                .proc_stat
                .as_ref()
                .and_then(|s| s.cpu.as_ref())
                .map(CpuTicks::busy_seconds),
        };

        let net = reading.net.unwrap_or_default();
        let (total_rx, total_tx) = net.totals(config.exclude_loopback);

        let current = RateState {
            at: now,
            cpu_seconds,
            rx_bytes: total_rx,
            tx_bytes: total_tx,
        };
        let rates = compute(self.previous.as_ref(), &current, limit_cores, host_cores);
        self.previous = Some(current);

        log::trace!("sampled in {:?}", started.elapsed());

        Snapshot {
            taken_at: now,
            host: reading.host,
            cgroup_mode: self.probe.descriptor().mode(),
            cpu: CpuSnapshot {
                cumulative_seconds: cpu_seconds,
                limit_cores,
                percent_of_limit: rates.cpu_percent_of_limit,
                percent_of_host: rates.cpu_percent_of_host,
            },
            memory,
            swap,
            disk: reading.disk.unwrap_or_default(),
            load: reading.load.unwrap_or_default(),
            network: NetworkSnapshot {
                total_rx,
                total_tx,
                rx_per_sec: rates.rx_per_sec,
                tx_per_sec: rates.tx_per_sec,
                interfaces: net.interfaces,
            },
            connections: reading.connections,
            processes: reading.processes,
            uptime_seconds: reading.uptime_seconds,
        }
    }

    /// Identity subset; leaves the rate state untouched.
    pub async fn basic_info(&self) -> Identity {
        self.probe.basic_info().await
    }
}
