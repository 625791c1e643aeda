//! Delivery of snapshots to the collector.
//!
//! Two independent schedules share one [`Probe`](crate::sampler::Probe):
//!
//! - **streaming**: a persistent WebSocket to `{endpoint}/api/clients/report`. While open,
//!   a fixed-interval timer samples and pushes a [`Report`]. Any close or error stops the
//!   timer and schedules exactly one reconnect after a fixed delay, indefinitely.
//! - **identity**: a [`BasicInfo`] document `POST`ed to
//!   `{endpoint}/api/clients/uploadBasicInfo` on startup and then periodically.
//!
//! The connection lifecycle is the pure [`transition`] function; [`ReportingClient`] only
//! performs the actions it returns.
mod client;
mod error;
mod identity;
mod payload;
mod state;

pub use client::{
    ClientConfig, HANDSHAKE_TIMEOUT, ReportingClient, basic_info_url, redact, report_url,
};
pub use error::{Error, Result};
pub use identity::{push_basic_info, run_identity};
pub use payload::{
    BasicInfo, Capacity, ConnectionsReport, CpuReport, LoadReport, MAX_CPU_PERCENT,
    NetworkReport, Report, clamp_cpu_percent,
};
pub use state::{Action, ConnectionState, Event, transition};
