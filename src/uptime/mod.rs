//! Container uptime.
//!
//! Determines how long the monitored container has been running. Inside a container with
//! its own PID namespace, PID 1 is the container's entrypoint and its start time is the
//! container's start time. When PID 1 turns out to be the host's init, the agent falls back
//! to its own process uptime.
mod checks;
mod detect;
mod error;

use std::fmt;
use std::str::FromStr;

pub use checks::{is_host_init, pid1_start_seconds, seconds_since};
pub use detect::UptimeResolver;
pub use error::{Error, Result};

/// Configured uptime source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UptimePolicy {
    /// Choose between [`UptimePolicy::Process`] and [`UptimePolicy::Pid1`] by inspecting
    /// PID 1's cgroup membership.
    #[default]
    Auto,
    /// Time since the agent process started.
    Process,
    /// Time since PID 1 started.
    Pid1,
}

/// Strategy actually used to compute the uptime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UptimeStrategy {
    Process,
    Pid1,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown uptime policy `{0}`, expected `auto`, `process` or `pid1`")]
pub struct UnknownPolicy(pub String);

impl FromStr for UptimePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(UptimePolicy::Auto),
            "process" => Ok(UptimePolicy::Process),
            "pid1" => Ok(UptimePolicy::Pid1),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}

impl fmt::Display for UptimePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UptimePolicy::Auto => f.write_str("auto"),
            UptimePolicy::Process => f.write_str("process"),
            UptimePolicy::Pid1 => f.write_str("pid1"),
        }
    }
}
