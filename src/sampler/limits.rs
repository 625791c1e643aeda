use std::fmt;
use std::str::FromStr;

use crate::cgroup::CgroupReading;
use crate::stats::MemInfo;

use super::Usage;

/// What to report when a container limit is unbounded or unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LimitFallback {
    /// Report the host's capacity.
    #[default]
    Host,
    /// Report `0`, meaning "no limit".
    Zero,
}

impl LimitFallback {
    pub fn bytes(self, limit: Option<u64>, host: u64) -> u64 {
        match (limit, self) {
            (Some(limit), _) => limit,
            (None, LimitFallback::Host) => host,
            (None, LimitFallback::Zero) => 0,
        }
    }

    pub fn cores(self, limit: Option<f64>, host: f64) -> f64 {
        match (limit, self) {
            (Some(limit), _) => limit,
            (None, LimitFallback::Host) => host,
            (None, LimitFallback::Zero) => 0.0,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown limit fallback `{0}`, expected `host` or `zero`")]
pub struct UnknownFallback(pub String);

impl FromStr for LimitFallback {
    type Err = UnknownFallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(LimitFallback::Host),
            "zero" => Ok(LimitFallback::Zero),
            _ => Err(UnknownFallback(s.to_owned())),
        }
    }
}

impl fmt::Display for LimitFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitFallback::Host => f.write_str("host"),
            LimitFallback::Zero => f.write_str("zero"),
        }
    }
}

/// Memory and swap usage of the container.
///
/// Limits come from the cgroup, with `fallback` applied when they are unbounded. Usage
/// comes from the cgroup when readable and from the host's meminfo otherwise. A non-zero
/// total caps the usage, since host-wide usage can exceed a container limit.
pub fn memory_usage(
    cgroup: &CgroupReading,
    meminfo: Option<&MemInfo>,
    fallback: LimitFallback,
) -> (Usage, Usage) {
    let host = meminfo.cloned().unwrap_or_default();
    let memory = capped(
        fallback.bytes(cgroup.memory_limit, host.total_bytes()),
        cgroup.memory_usage.unwrap_or_else(|| host.used_bytes()),
    );
    let swap = capped(
        fallback.bytes(cgroup.swap_limit, host.swap_total_bytes()),
        cgroup.swap_usage.unwrap_or_else(|| host.swap_used_bytes()),
    );
    (memory, swap)
}

fn capped(total: u64, used: u64) -> Usage {
    // 0 is the "no limit" sentinel of the zero fallback
    let used = if total > 0 { used.min(total) } else { used };
    Usage { total, used }
}
