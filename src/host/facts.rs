use super::{HostFacts, SystemPaths};
use crate::fsutil;

const UNKNOWN: &str = "unknown";

/// CPU model and logical processor count from `/proc/cpuinfo`.
///
/// The model is the first `model name` (x86), `Hardware` or `Processor` (ARM) entry.
pub fn parse_cpuinfo(contents: &str) -> (Option<String>, usize) {
    let mut model = None;
    let mut processors = 0;

    for line in contents.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "processor" => processors += 1,
            "model name" | "Hardware" | "Processor" if model.is_none() => {
                let value = value.trim();
                if !value.is_empty() {
                    model = Some(value.to_owned());
                }
            }
            _ => {}
        }
    }

    (model, processors)
}

/// `PRETTY_NAME` from an os-release file, with optional surrounding quotes removed.
pub fn parse_os_release(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let value = line.trim().strip_prefix("PRETTY_NAME=")?;
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        (!value.is_empty()).then(|| value.to_owned())
    })
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

async fn read_trimmed(path: impl AsRef<std::path::Path>) -> Option<String> {
    fsutil::read_parsed(path, |s| Ok(s.trim().to_owned()))
        .await
        .filter(|s| !s.is_empty())
}

/// Gathers the host identity facts. Unreadable sources fall back to placeholders.
pub async fn gather(paths: &SystemPaths) -> HostFacts {
    let (hostname, kernel, cpuinfo, os) = tokio::join!(
        read_trimmed(paths.proc_root.join("sys/kernel/hostname")),
        read_trimmed(paths.proc_root.join("sys/kernel/osrelease")),
        fsutil::read_parsed(paths.proc_root.join("cpuinfo"), |s| Ok(parse_cpuinfo(s))),
        fsutil::read_parsed(&paths.os_release, |s| Ok(parse_os_release(s))),
    );
    let (cpu_name, processors) = cpuinfo.unwrap_or((None, 0));
    let cpu_cores = if processors > 0 {
        processors
    } else {
        available_parallelism()
    };

    HostFacts {
        hostname: hostname.unwrap_or_else(|| UNKNOWN.to_owned()),
        arch: std::env::consts::ARCH.to_owned(),
        kernel_version: kernel.unwrap_or_else(|| UNKNOWN.to_owned()),
        cpu_name: cpu_name.unwrap_or_else(|| UNKNOWN.to_owned()),
        cpu_cores,
        os: os.flatten().unwrap_or_else(|| "Linux".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const X86_CPUINFO: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) CPU @ 2.20GHz
cpu MHz\t\t: 2200.000

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) CPU @ 2.20GHz
";

    const ARM_CPUINFO: &str = "\
Processor\t: ARMv7 Processor rev 4 (v7l)
processor\t: 0
BogoMIPS\t: 38.40
processor\t: 1
Hardware\t: BCM2835
";

    #[test]
    fn test_parse_cpuinfo_x86() {
        let (model, cores) = parse_cpuinfo(X86_CPUINFO);
        assert_eq!(model.as_deref(), Some("Intel(R) Xeon(R) CPU @ 2.20GHz"));
        assert_eq!(cores, 2);
    }

    #[test]
    fn test_parse_cpuinfo_arm() {
        let (model, cores) = parse_cpuinfo(ARM_CPUINFO);
        assert_eq!(model.as_deref(), Some("ARMv7 Processor rev 4 (v7l)"));
        assert_eq!(cores, 2);
    }

    #[test]
    fn test_parse_os_release() {
        let data = "NAME=\"Alpine Linux\"\nID=alpine\nPRETTY_NAME=\"Alpine Linux v3.20\"\n";
        assert_eq!(parse_os_release(data).as_deref(), Some("Alpine Linux v3.20"));
        assert_eq!(
            parse_os_release("PRETTY_NAME=Debian\n").as_deref(),
            Some("Debian")
        );
        assert_eq!(
            parse_os_release("PRETTY_NAME='Fedora 40'\n").as_deref(),
            Some("Fedora 40")
        );
        assert_eq!(parse_os_release("ID=scratch\n"), None);
    }

    #[tokio::test]
    async fn test_gather_with_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let proc_root = dir.path().join("proc");
        fs::create_dir_all(proc_root.join("sys/kernel")).unwrap();
        fs::write(proc_root.join("sys/kernel/hostname"), "web-1\n").unwrap();
        fs::write(proc_root.join("cpuinfo"), X86_CPUINFO).unwrap();

        let paths = SystemPaths {
            proc_root,
            cgroup_root: dir.path().join("cgroup"),
            os_release: dir.path().join("os-release"),
        };
        let facts = gather(&paths).await;
        assert_eq!(facts.hostname, "web-1");
        assert_eq!(facts.kernel_version, "unknown");
        assert_eq!(facts.cpu_cores, 2);
        assert_eq!(facts.os, "Linux");
        assert_eq!(facts.arch, std::env::consts::ARCH);
    }
}
