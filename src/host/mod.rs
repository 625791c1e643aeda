//! Host-level facts: identity, local addresses and socket counts.
//!
//! All readers take their roots from [`SystemPaths`] so tests can point them at a synthetic
//! tree. Unavailable sources degrade to placeholders or zero instead of failing.
mod addr;
mod connections;
mod error;
mod facts;

use std::path::PathBuf;

pub use addr::{detect_addresses, outbound_addr};
pub use connections::{ConnectionCounts, count_connections, count_entries};
pub use error::{Error, Result};
pub use facts::{gather, parse_cpuinfo, parse_os_release};

/// Filesystem roots the agent reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    pub proc_root: PathBuf,
    pub cgroup_root: PathBuf,
    pub os_release: PathBuf,
}

impl Default for SystemPaths {
    fn default() -> Self {
        SystemPaths {
            proc_root: PathBuf::from("/proc"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

/// Mostly static identity of the machine the agent runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub hostname: String,
    pub arch: String,
    pub kernel_version: String,
    pub cpu_name: String,
    pub cpu_cores: usize,
    pub os: String,
}
