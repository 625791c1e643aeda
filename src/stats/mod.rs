//! Parsers for the procfs and cgroup files the agent samples.
//!
//! Every file format is mapped to a small, strongly typed struct. Parsing is kept free of I/O
//! beyond a [`std::io::BufRead`], so callers decide how the file is read (the sampler loads
//! whole files asynchronously and hands the contents to `parse_str`).
//!
//! # Main types
//!
//! - cgroup v2: [`CpuStat`], [`CpuMax`], [`MemoryUsage`], [`MemoryLimit`]
//! - cgroup v1: [`CpuAcctUsage`], [`CfsQuota`], [`CfsPeriod`], [`MemoryUsage`], [`MemoryLimit`]
//! - procfs: [`MemInfo`], [`ProcStat`], [`LoadAverage`], [`NetDev`], [`ProcessStatus`]

mod cpu;
mod error;
mod loadavg;
mod meminfo;
mod memory;
mod net;
mod parser;
mod procstat;
mod status;

pub use cpu::{CfsPeriod, CfsQuota, CpuAcctUsage, CpuMax, CpuStat, DEFAULT_PERIOD_US, quota_to_cores};
pub use error::StatParseError;
pub use loadavg::LoadAverage;
pub use meminfo::MemInfo;
pub use memory::{MemoryLimit, MemoryUsage, V1_UNBOUNDED_THRESHOLD};
pub use net::{InterfaceCounters, NetDev};
pub use parser::{KeyValueStat, SingleLineStat};
pub use procstat::{CpuTicks, ProcStat, USER_HZ, parse_start_ticks};
pub use status::ProcessStatus;
