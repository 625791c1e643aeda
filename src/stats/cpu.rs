//! CPU accounting files for both cgroup generations.
//!
//! - cgroup v2: `cpu.stat` ([`CpuStat`], key-value) and `cpu.max` ([`CpuMax`], `"<quota|max> <period>"`).
//! - cgroup v1: `cpuacct.usage` ([`CpuAcctUsage`], nanoseconds), `cpu.cfs_quota_us`
//!   ([`CfsQuota`], `-1` meaning unlimited) and `cpu.cfs_period_us` ([`CfsPeriod`]).
//!
//! Both generations are normalised to cumulative seconds and a core count, which is all the
//! sampler needs.
//!
//! # Examples
//!
//! ```rust
//! use creo_agent::stats::{CpuMax, CpuStat, KeyValueStat, SingleLineStat};
//!
//! let stat = CpuStat::parse_str("usage_usec 1500000\nuser_usec 1000000\n").unwrap();
//! assert_eq!(stat.usage_seconds(), 1.5);
//!
//! let limit = CpuMax::parse_str("50000 100000\n").unwrap();
//! assert_eq!(limit.cores(), Some(0.5));
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::parser::read_single_value;
use super::{KeyValueStat, SingleLineStat};

/// Default CFS enforcement period in microseconds.
pub const DEFAULT_PERIOD_US: u64 = 100_000;

/// Parsed `cpu.stat` (cgroup v2). Values are in microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuStat {
    /// Total CPU time consumed by the group (user + system).
    pub usage_usec: u64,
    pub user_usec: u64,
    pub system_usec: u64,
}

impl CpuStat {
    /// Cumulative CPU time in seconds.
    pub fn usage_seconds(&self) -> f64 {
        self.usage_usec as f64 / 1_000_000.0
    }
}

type Setter = fn(&mut CpuStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(3);

    m.insert("usage_usec", |s, v| s.usage_usec = v);
    m.insert("user_usec", |s, v| s.user_usec = v);
    m.insert("system_usec", |s, v| s.system_usec = v);

    m
});

impl KeyValueStat for CpuStat {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// CPU bandwidth limit from `cpu.max` (cgroup v2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuMax {
    /// Allowed CPU time per period in microseconds; `None` for `max` (unlimited).
    pub quota: Option<u64>,
    /// Enforcement period in microseconds.
    pub period: u64,
}

impl Default for CpuMax {
    fn default() -> Self {
        Self {
            quota: None,
            period: DEFAULT_PERIOD_US,
        }
    }
}

impl CpuMax {
    /// Effective number of cores the quota allows, or `None` when unlimited.
    pub fn cores(&self) -> Option<f64> {
        quota_to_cores(self.quota, self.period)
    }
}

impl SingleLineStat for CpuMax {
    /// Parses `"<quota> <period>"` or `"max [<period>]"`.
    ///
    /// Never fails on content: an unparsable quota is treated as unlimited and an
    /// unparsable or missing period falls back to [`DEFAULT_PERIOD_US`].
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let mut parts = line.split_whitespace();
        let quota = match parts.next() {
            None | Some("max") => None,
            Some(quota) => quota.parse::<u64>().ok(),
        };
        let period = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PERIOD_US);

        Ok(CpuMax { quota, period })
    }
}

/// Cumulative CPU time from `cpuacct.usage` (cgroup v1), in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuAcctUsage {
    pub usage_ns: u64,
}

impl CpuAcctUsage {
    pub fn usage_seconds(&self) -> f64 {
        self.usage_ns as f64 / 1_000_000_000.0
    }
}

impl SingleLineStat for CpuAcctUsage {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            usage_ns: read_single_value(buf)?,
        })
    }
}

/// CFS quota from `cpu.cfs_quota_us` (cgroup v1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CfsQuota {
    /// Quota in microseconds; `None` when the file holds `-1` (unlimited).
    pub quota_us: Option<u64>,
}

impl SingleLineStat for CfsQuota {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let raw: i64 = read_single_value(buf)?;
        Ok(Self {
            quota_us: u64::try_from(raw).ok(),
        })
    }
}

/// CFS period from `cpu.cfs_period_us` (cgroup v1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfsPeriod {
    pub period_us: u64,
}

impl Default for CfsPeriod {
    fn default() -> Self {
        Self {
            period_us: DEFAULT_PERIOD_US,
        }
    }
}

impl SingleLineStat for CfsPeriod {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            period_us: read_single_value(buf)?,
        })
    }
}

/// Converts a CFS quota/period pair into a core count.
pub fn quota_to_cores(quota: Option<u64>, period: u64) -> Option<f64> {
    match quota {
        Some(quota) if period > 0 => Some(quota as f64 / period as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::error::{StatParseError, extract_stat_parse_error};

    #[test]
    fn test_parse_empty_cpu_stat() {
        let stat = CpuStat::parse_str("").unwrap();
        assert_eq!(stat, CpuStat::default());
    }

    #[test]
    fn test_parse_complete_cpu_stat() {
        let data = "\
usage_usec 623932088000
user_usec 421230248000
system_usec 202701840000
nr_periods 0
nr_throttled 0
throttled_usec 0
";
        let stat = CpuStat::parse_str(data).unwrap();

        assert_eq!(stat.usage_usec, 623_932_088_000);
        assert_eq!(stat.user_usec, 421_230_248_000);
        assert_eq!(stat.system_usec, 202_701_840_000);
        assert_eq!(stat.usage_seconds(), 623_932.088);
    }

    #[test]
    fn test_parse_invalid_cpu_stat() {
        let data = "\
invalid_line
usage_usec abc
user_usec 42
";
        let err = CpuStat::parse_str(data).unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        match extract_stat_parse_error(&err) {
            StatParseError::InvalidKeyValue {
                key, value, line, ..
            } => {
                assert_eq!(key, "usage_usec");
                assert_eq!(value, "abc");
                assert_eq!(*line, 2);
            }
            _ => panic!("Expected InvalidKeyValue error"),
        }
    }

    #[test]
    fn test_parse_cpu_max() {
        let limit = CpuMax::parse_str("50000 100000\n").unwrap();
        assert_eq!(limit.quota, Some(50000));
        assert_eq!(limit.period, 100000);
        assert_eq!(limit.cores(), Some(0.5));
    }

    #[test]
    fn test_parse_cpu_max_unlimited() {
        let limit = CpuMax::parse_str("max 250000").unwrap();
        assert_eq!(limit.quota, None);
        assert_eq!(limit.period, 250000);
        assert_eq!(limit.cores(), None);

        let limit = CpuMax::parse_str("").unwrap();
        assert_eq!(limit, CpuMax::default());
    }

    #[test]
    fn test_parse_cpuacct_usage() {
        let usage = CpuAcctUsage::parse_str("2500000000\n").unwrap();
        assert_eq!(usage.usage_seconds(), 2.5);

        let err = CpuAcctUsage::parse_str("n/a\n").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_parse_cfs_quota() {
        assert_eq!(CfsQuota::parse_str("-1\n").unwrap().quota_us, None);
        assert_eq!(CfsQuota::parse_str("200000\n").unwrap().quota_us, Some(200_000));
    }

    #[test]
    fn test_quota_to_cores_zero_period() {
        assert_eq!(quota_to_cores(Some(100), 0), None);
        assert_eq!(quota_to_cores(Some(200_000), 100_000), Some(2.0));
    }
}
