use crate::fsutil::read_parsed_opt;
use crate::stats::{
    CfsPeriod, CfsQuota, CpuAcctUsage, CpuMax, CpuStat, KeyValueStat, MemoryLimit, MemoryUsage,
    SingleLineStat, quota_to_cores,
};

use super::{CgroupDescriptor, CgroupFile, CgroupMode};

/// Values read from the cgroup files of one descriptor.
///
/// `None` means either that the source was unavailable or, for limits, that no limit is set.
/// The sampler applies the configured fallback to both cases.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CgroupReading {
    /// Cumulative CPU time consumed by the group.
    pub cpu_seconds: Option<f64>,
    pub cpu_limit_cores: Option<f64>,
    pub memory_usage: Option<u64>,
    pub memory_limit: Option<u64>,
    pub swap_usage: Option<u64>,
    pub swap_limit: Option<u64>,
}

/// Reads every file named by `descriptor`. Each file failure only affects its own value.
pub async fn read(descriptor: &CgroupDescriptor) -> CgroupReading {
    match descriptor.mode() {
        CgroupMode::V2 => read_v2(descriptor).await,
        CgroupMode::V1 => read_v1(descriptor).await,
        CgroupMode::Unavailable => CgroupReading::default(),
    }
}

async fn read_v2(d: &CgroupDescriptor) -> CgroupReading {
    let (cpu_stat, cpu_max, memory_usage, memory_limit, swap_usage, swap_limit) = tokio::join!(
        read_parsed_opt(d.path(CgroupFile::CpuUsage), CpuStat::parse_str),
        read_parsed_opt(d.path(CgroupFile::CpuQuota), CpuMax::parse_str),
        read_parsed_opt(d.path(CgroupFile::MemoryUsage), MemoryUsage::parse_str),
        read_parsed_opt(d.path(CgroupFile::MemoryLimit), MemoryLimit::parse_str),
        read_parsed_opt(d.path(CgroupFile::SwapUsage), MemoryUsage::parse_str),
        read_parsed_opt(d.path(CgroupFile::SwapLimit), MemoryLimit::parse_str),
    );

    CgroupReading {
        cpu_seconds: cpu_stat.map(|s| s.usage_seconds()),
        cpu_limit_cores: cpu_max.and_then(|m| m.cores()),
        memory_usage: memory_usage.map(|m| m.usage_bytes),
        memory_limit: memory_limit.and_then(|m| m.limit_bytes),
        swap_usage: swap_usage.map(|m| m.usage_bytes),
        swap_limit: swap_limit.and_then(|m| m.limit_bytes),
    }
}

async fn read_v1(d: &CgroupDescriptor) -> CgroupReading {
    let (cpu_usage, quota, period, memory_usage, memory_limit, memsw_usage, memsw_limit) = tokio::join!(
        read_parsed_opt(d.path(CgroupFile::CpuUsage), CpuAcctUsage::parse_str),
        read_parsed_opt(d.path(CgroupFile::CpuQuota), CfsQuota::parse_str),
        read_parsed_opt(d.path(CgroupFile::CpuPeriod), CfsPeriod::parse_str),
        read_parsed_opt(d.path(CgroupFile::MemoryUsage), MemoryUsage::parse_str),
        read_parsed_opt(d.path(CgroupFile::MemoryLimit), MemoryLimit::parse_str),
        read_parsed_opt(d.path(CgroupFile::SwapUsage), MemoryUsage::parse_str),
        read_parsed_opt(d.path(CgroupFile::SwapLimit), MemoryLimit::parse_str),
    );

    let memory_usage = memory_usage.map(|m| m.usage_bytes);
    let memory_limit = memory_limit.and_then(|m| m.limit_bytes);
    // memsw accounts memory and swap together; swap is whatever exceeds plain memory.
    let swap_usage = memsw_usage
        .map(|m| m.usage_bytes.saturating_sub(memory_usage.unwrap_or(0)));
    let swap_limit = memsw_limit
        .and_then(|m| m.limit_bytes)
        .map(|limit| limit.saturating_sub(memory_limit.unwrap_or(0)));

    CgroupReading {
        cpu_seconds: cpu_usage.map(|u| u.usage_seconds()),
        cpu_limit_cores: quota.and_then(|q| {
            quota_to_cores(q.quota_us, period.unwrap_or_default().period_us)
        }),
        memory_usage,
        memory_limit,
        swap_usage,
        swap_limit,
    }
}
