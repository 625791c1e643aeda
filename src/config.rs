//! Agent configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `AGENT_ENDPOINT` | required, `http` or `https` URL |
//! | `AGENT_TOKEN` | required |
//! | `AGENT_REPORT_INTERVAL_MS` | `1000` |
//! | `AGENT_INFO_INTERVAL_SECS` | `300` |
//! | `AGENT_RECONNECT_DELAY_MS` | `5000` |
//! | `AGENT_DISK_PATH` | `/` |
//! | `AGENT_UPTIME_POLICY` | `auto` (`process`, `pid1`) |
//! | `AGENT_MEMORY_FALLBACK` | `host` (`zero`) |
//! | `AGENT_EXCLUDE_LOOPBACK` | `true` |
//! | `AGENT_LOG_EVERY` | `0` (off) |
//! | `AGENT_LOG_INBOUND` | `false` |
//! | `AGENT_PROC_ROOT` | `/proc` |
//! | `AGENT_CGROUP_ROOT` | `/sys/fs/cgroup` |
//! | `AGENT_IPV4`, `AGENT_IPV6` | detected |
//!
//! Empty values are treated as unset.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::host::SystemPaths;
use crate::report::ClientConfig;
use crate::sampler::{LimitFallback, ProbeConfig, SCAN_WORKERS};
use crate::uptime::UptimePolicy;

pub const ENDPOINT: &str = "AGENT_ENDPOINT";
pub const TOKEN: &str = "AGENT_TOKEN";
pub const REPORT_INTERVAL_MS: &str = "AGENT_REPORT_INTERVAL_MS";
pub const INFO_INTERVAL_SECS: &str = "AGENT_INFO_INTERVAL_SECS";
pub const RECONNECT_DELAY_MS: &str = "AGENT_RECONNECT_DELAY_MS";
pub const DISK_PATH: &str = "AGENT_DISK_PATH";
pub const UPTIME_POLICY: &str = "AGENT_UPTIME_POLICY";
pub const MEMORY_FALLBACK: &str = "AGENT_MEMORY_FALLBACK";
pub const EXCLUDE_LOOPBACK: &str = "AGENT_EXCLUDE_LOOPBACK";
pub const LOG_EVERY: &str = "AGENT_LOG_EVERY";
pub const LOG_INBOUND: &str = "AGENT_LOG_INBOUND";
pub const PROC_ROOT: &str = "AGENT_PROC_ROOT";
pub const CGROUP_ROOT: &str = "AGENT_CGROUP_ROOT";
pub const IPV4: &str = "AGENT_IPV4";
pub const IPV6: &str = "AGENT_IPV6";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("environment variable `{0}` must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for `{var}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub report: ClientConfig,
    pub probe: ProbeConfig,
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, var: &'static str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String> {
        self.optional(var).ok_or(Error::Missing(var))
    }

    fn parse_or<T>(&self, var: &'static str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(var) {
            None => Ok(default),
            Some(value) => value.parse::<T>().map_err(|err| Error::Invalid {
                var,
                reason: err.to_string(),
                value,
            }),
        }
    }

    fn flag_or(&self, var: &'static str, default: bool) -> Result<bool> {
        match self.optional(var) {
            None => Ok(default),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(Error::Invalid {
                    var,
                    value,
                    reason: "expected a boolean".to_owned(),
                }),
            },
        }
    }

    fn positive_or(&self, var: &'static str, default: u64) -> Result<u64> {
        let value = self.parse_or(var, default)?;
        if value == 0 {
            return Err(Error::Invalid {
                var,
                value: value.to_string(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(value)
    }
}

fn parse_endpoint(value: String) -> Result<Url> {
    let url = Url::parse(&value).map_err(|err| Error::Invalid {
        var: ENDPOINT,
        value: value.clone(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Invalid {
            var: ENDPOINT,
            value,
            reason: "expected an http or https URL".to_owned(),
        });
    }
    Ok(url)
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars { lookup };

        let endpoint = parse_endpoint(vars.required(ENDPOINT)?)?;
        let token = vars.required(TOKEN)?;
        let report = ClientConfig {
            endpoint,
            token,
            report_interval: Duration::from_millis(vars.positive_or(REPORT_INTERVAL_MS, 1000)?),
            info_interval: Duration::from_secs(vars.positive_or(INFO_INTERVAL_SECS, 300)?),
            reconnect_delay: Duration::from_millis(vars.parse_or(RECONNECT_DELAY_MS, 5000)?),
            log_every: vars.parse_or(LOG_EVERY, 0)?,
            log_inbound: vars.flag_or(LOG_INBOUND, false)?,
        };

        let defaults = SystemPaths::default();
        let probe = ProbeConfig {
            paths: SystemPaths {
                proc_root: vars.parse_or(PROC_ROOT, defaults.proc_root)?,
                cgroup_root: vars.parse_or(CGROUP_ROOT, defaults.cgroup_root)?,
                os_release: defaults.os_release,
            },
            disk_path: vars.parse_or(DISK_PATH, PathBuf::from("/"))?,
            uptime_policy: vars.parse_or(UPTIME_POLICY, UptimePolicy::Auto)?,
            limit_fallback: vars.parse_or(MEMORY_FALLBACK, LimitFallback::Host)?,
            exclude_loopback: vars.flag_or(EXCLUDE_LOOPBACK, true)?,
            ipv4: vars.optional(IPV4),
            ipv6: vars.optional(IPV6),
            scan_workers: SCAN_WORKERS,
        };

        Ok(Config { report, probe })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        (ENDPOINT, "https://collector.example.com"),
        (TOKEN, "s3cr3t"),
    ];

    #[test]
    fn test_defaults() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.report.endpoint.as_str(), "https://collector.example.com/");
        assert_eq!(config.report.report_interval, Duration::from_secs(1));
        assert_eq!(config.report.info_interval, Duration::from_secs(300));
        assert_eq!(config.report.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.report.log_every, 0);
        assert!(!config.report.log_inbound);
        assert_eq!(config.probe, ProbeConfig::default());
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            (REPORT_INTERVAL_MS, "250"),
            (UPTIME_POLICY, "pid1"),
            (MEMORY_FALLBACK, "zero"),
            (EXCLUDE_LOOPBACK, "false"),
            (LOG_EVERY, "10"),
            (PROC_ROOT, "/host/proc"),
            (IPV4, "192.0.2.7"),
            (IPV6, "  "),
        ]);
        let config = config(&vars).unwrap();
        assert_eq!(config.report.report_interval, Duration::from_millis(250));
        assert_eq!(config.report.log_every, 10);
        assert_eq!(config.probe.uptime_policy, UptimePolicy::Pid1);
        assert_eq!(config.probe.limit_fallback, LimitFallback::Zero);
        assert!(!config.probe.exclude_loopback);
        assert_eq!(config.probe.paths.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.probe.ipv4.as_deref(), Some("192.0.2.7"));
        assert_eq!(config.probe.ipv6, None);
    }

    #[test]
    fn test_missing_required() {
        assert_eq!(config(&[]).unwrap_err(), Error::Missing(ENDPOINT));
        assert_eq!(
            config(&[(ENDPOINT, "http://localhost"), (TOKEN, "")]).unwrap_err(),
            Error::Missing(TOKEN)
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = config(&[(ENDPOINT, "ftp://example.com"), (TOKEN, "t")]).unwrap_err();
        assert!(matches!(err, Error::Invalid { var: ENDPOINT, .. }));

        let err = config(&[(ENDPOINT, "not a url"), (TOKEN, "t")]).unwrap_err();
        assert!(matches!(err, Error::Invalid { var: ENDPOINT, .. }));

        let mut vars = REQUIRED.to_vec();
        vars.push((REPORT_INTERVAL_MS, "0"));
        assert!(matches!(
            config(&vars).unwrap_err(),
            Error::Invalid {
                var: REPORT_INTERVAL_MS,
                ..
            }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push((UPTIME_POLICY, "boot"));
        assert!(matches!(
            config(&vars).unwrap_err(),
            Error::Invalid {
                var: UPTIME_POLICY,
                ..
            }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push((LOG_INBOUND, "maybe"));
        assert!(matches!(
            config(&vars).unwrap_err(),
            Error::Invalid { var: LOG_INBOUND, .. }
        ));
    }
}
