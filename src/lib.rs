//! Creo Agent: a node-local agent that measures its container's resource consumption and
//! streams it to a remote collector.
//!
//! Metrics come from the cgroup filesystem (v1 or v2, with host fallbacks) and procfs.
//! Cumulative counters are turned into rates between consecutive samples and each sample is
//! pushed over a persistent WebSocket that reconnects on its own. Slowly changing identity
//! facts are published separately over HTTP.
pub mod cgroup;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod host;
pub mod report;
pub mod sampler;
pub mod stats;
pub mod uptime;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use config::Config;

/// Runs the agent until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the reporting client cannot be created (e.g. an unsupported
/// endpoint) or one of its tasks fails unexpectedly.
pub async fn run(config: Config, cancel: CancellationToken) -> report::Result<()> {
    log::info!(
        "starting agent for {} (report every {:?}, identity every {:?})",
        report::redact(&config.report.endpoint),
        config.report.report_interval,
        config.report.info_interval
    );
    let probe = Arc::new(sampler::Probe::new(config.probe));
    report::ReportingClient::new(config.report, probe)?
        .run(cancel)
        .await
}
