use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Version of the resource-control interface visible to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CgroupMode {
    V1,
    V2,
    Unavailable,
}

impl fmt::Display for CgroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CgroupMode::V1 => f.write_str("v1"),
            CgroupMode::V2 => f.write_str("v2"),
            CgroupMode::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Logical metric files, independent of the interface version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CgroupFile {
    CpuUsage,
    CpuQuota,
    CpuPeriod,
    MemoryUsage,
    MemoryLimit,
    SwapUsage,
    SwapLimit,
}

impl CgroupFile {
    pub const ALL: [CgroupFile; 7] = [
        CgroupFile::CpuUsage,
        CgroupFile::CpuQuota,
        CgroupFile::CpuPeriod,
        CgroupFile::MemoryUsage,
        CgroupFile::MemoryLimit,
        CgroupFile::SwapUsage,
        CgroupFile::SwapLimit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CgroupFile::CpuUsage => "cpu_usage",
            CgroupFile::CpuQuota => "cpu_quota",
            CgroupFile::CpuPeriod => "cpu_period",
            CgroupFile::MemoryUsage => "memory_usage",
            CgroupFile::MemoryLimit => "memory_limit",
            CgroupFile::SwapUsage => "swap_usage",
            CgroupFile::SwapLimit => "swap_limit",
        }
    }

    /// File name in a cgroup v2 group directory. The period lives inside `cpu.max` on v2.
    pub fn v2_file_name(self) -> Option<&'static str> {
        match self {
            CgroupFile::CpuUsage => Some("cpu.stat"),
            CgroupFile::CpuQuota => Some("cpu.max"),
            CgroupFile::CpuPeriod => None,
            CgroupFile::MemoryUsage => Some("memory.current"),
            CgroupFile::MemoryLimit => Some("memory.max"),
            CgroupFile::SwapUsage => Some("memory.swap.current"),
            CgroupFile::SwapLimit => Some("memory.swap.max"),
        }
    }

    pub fn v1_file_name(self) -> &'static str {
        match self {
            CgroupFile::CpuUsage => "cpuacct.usage",
            CgroupFile::CpuQuota => "cpu.cfs_quota_us",
            CgroupFile::CpuPeriod => "cpu.cfs_period_us",
            CgroupFile::MemoryUsage => "memory.usage_in_bytes",
            CgroupFile::MemoryLimit => "memory.limit_in_bytes",
            CgroupFile::SwapUsage => "memory.memsw.usage_in_bytes",
            CgroupFile::SwapLimit => "memory.memsw.limit_in_bytes",
        }
    }

    /// The v1 controller owning the file, as it appears in the membership file.
    pub fn v1_controller(self) -> &'static str {
        match self {
            CgroupFile::CpuUsage => "cpuacct",
            CgroupFile::CpuQuota | CgroupFile::CpuPeriod => "cpu",
            CgroupFile::MemoryUsage
            | CgroupFile::MemoryLimit
            | CgroupFile::SwapUsage
            | CgroupFile::SwapLimit => "memory",
        }
    }

    /// Directory names the v1 controller is commonly mounted under, in probe order.
    pub fn v1_mount_candidates(self) -> &'static [&'static str] {
        match self.v1_controller() {
            "cpuacct" => &["cpuacct", "cpu,cpuacct", "cpuacct,cpu"],
            "cpu" => &["cpu", "cpu,cpuacct", "cpuacct,cpu"],
            _ => &["memory"],
        }
    }
}

/// Where to read each cgroup metric from.
///
/// Resolved once per process and never mutated afterwards. A missing entry means the metric
/// is unavailable and readers skip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupDescriptor {
    mode: CgroupMode,
    paths: HashMap<CgroupFile, PathBuf>,
}

impl CgroupDescriptor {
    pub fn unavailable() -> Self {
        CgroupDescriptor {
            mode: CgroupMode::Unavailable,
            paths: HashMap::new(),
        }
    }

    pub fn builder(mode: CgroupMode) -> DescriptorBuilder {
        DescriptorBuilder {
            mode,
            paths: HashMap::new(),
        }
    }

    pub fn mode(&self) -> CgroupMode {
        self.mode
    }

    pub fn path(&self, file: CgroupFile) -> Option<&Path> {
        self.paths.get(&file).map(PathBuf::as_path)
    }
}

#[derive(Debug)]
pub struct DescriptorBuilder {
    mode: CgroupMode,
    paths: HashMap<CgroupFile, PathBuf>,
}

impl DescriptorBuilder {
    /// Sets the path for `file` unconditionally.
    pub fn set_path(&mut self, file: CgroupFile, path: impl Into<PathBuf>) -> &mut Self {
        self.paths.insert(file, path.into());
        self
    }

    /// Sets the path for `file` to the first candidate that exists on disk.
    ///
    /// Leaves the entry absent when none of the candidates exist.
    pub fn set_first_existing(
        &mut self,
        file: CgroupFile,
        candidates: impl IntoIterator<Item = PathBuf>,
    ) -> &mut Self {
        match candidates.into_iter().find(|p| p.is_file()) {
            Some(path) => {
                log::debug!("cgroup {} -> {}", file.name(), path.display());
                self.paths.insert(file, path);
            }
            None => log::debug!("cgroup {} not found", file.name()),
        }
        self
    }

    pub fn build(&mut self) -> CgroupDescriptor {
        CgroupDescriptor {
            mode: self.mode,
            paths: std::mem::take(&mut self.paths),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("memory.max");
        std::fs::write(&present, "max\n").unwrap();

        let descriptor = CgroupDescriptor::builder(CgroupMode::V2)
            .set_first_existing(
                CgroupFile::MemoryLimit,
                [dir.path().join("nope/memory.max"), present.clone()],
            )
            .set_first_existing(CgroupFile::SwapLimit, [dir.path().join("memory.swap.max")])
            .build();

        assert_eq!(descriptor.mode(), CgroupMode::V2);
        assert_eq!(descriptor.path(CgroupFile::MemoryLimit), Some(present.as_path()));
        assert_eq!(descriptor.path(CgroupFile::SwapLimit), None);
    }

    #[test]
    fn test_unavailable_has_no_paths() {
        let descriptor = CgroupDescriptor::unavailable();
        assert_eq!(descriptor.mode(), CgroupMode::Unavailable);
        assert!(CgroupFile::ALL.iter().all(|f| descriptor.path(*f).is_none()));
    }

    #[test]
    fn test_v2_has_no_period_file() {
        assert_eq!(CgroupFile::CpuPeriod.v2_file_name(), None);
        assert_eq!(CgroupFile::CpuQuota.v2_file_name(), Some("cpu.max"));
        assert_eq!(CgroupFile::CpuPeriod.v1_file_name(), "cpu.cfs_period_us");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CgroupMode::V1.to_string(), "v1");
        assert_eq!(
            serde_json::to_string(&CgroupMode::Unavailable).unwrap(),
            "\"unavailable\""
        );
    }
}
