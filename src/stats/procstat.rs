//! Parsing of the kernel-wide `/proc/stat` table and per-process `/proc/<pid>/stat` records.

use std::io::BufRead;

use super::StatParseError;

/// Clock ticks per second used by procfs (`USER_HZ`). Fixed at 100 on every mainstream
/// Linux ABI regardless of the kernel's internal `HZ`.
pub const USER_HZ: u64 = 100;

/// Aggregate CPU time of the host, from the first `cpu` line of `/proc/stat`, in clock ticks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTicks {
    /// Busy (non-idle) CPU time in seconds, summed over all cores.
    pub fn busy_seconds(&self) -> f64 {
        let busy = self.user + self.nice + self.system + self.irq + self.softirq + self.steal;
        busy as f64 / USER_HZ as f64
    }
}

/// The parts of `/proc/stat` the agent uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcStat {
    /// Aggregate `cpu` line.
    pub cpu: Option<CpuTicks>,
    /// Boot time in seconds since the UNIX epoch (`btime`).
    pub boot_time: Option<u64>,
}

impl ProcStat {
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = ProcStat::default();
        let mut line = String::new();

        while buf.read_line(&mut line)? != 0 {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("cpu") => {
                    let mut ticks = parts.map(|v| v.parse::<u64>().unwrap_or(0));
                    let mut next = || ticks.next().unwrap_or(0);
                    stat.cpu = Some(CpuTicks {
                        user: next(),
                        nice: next(),
                        system: next(),
                        idle: next(),
                        iowait: next(),
                        irq: next(),
                        softirq: next(),
                        steal: next(),
                    });
                }
                Some("btime") => {
                    stat.boot_time = parts.next().and_then(|v| v.parse::<u64>().ok());
                }
                _ => {}
            }
            if stat.cpu.is_some() && stat.boot_time.is_some() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }

    pub fn parse_str(contents: &str) -> std::io::Result<Self> {
        Self::from_reader(&mut contents.as_bytes())
    }
}

/// Extracts the start time (field 22, in clock ticks after boot) from a `/proc/<pid>/stat` record.
///
/// The command name (field 2) is wrapped in parentheses and may itself contain spaces and
/// parentheses, so fields are counted from the last `)`.
///
/// # Errors
///
/// Returns [`StatParseError::MissingField`] if the record is truncated and
/// [`StatParseError::InvalidValue`] if the field is not an integer.
pub fn parse_start_ticks(record: &str) -> Result<u64, StatParseError> {
    const START_TIME_FIELD: &str = "starttime";
    // fields after the command name start at field 3 (state)
    const START_TIME_OFFSET: usize = 22 - 3;

    let (_, rest) = record
        .rsplit_once(')')
        .ok_or(StatParseError::MissingField {
            field: START_TIME_FIELD,
        })?;
    let raw = rest
        .split_whitespace()
        .nth(START_TIME_OFFSET)
        .ok_or(StatParseError::MissingField {
            field: START_TIME_FIELD,
        })?;
    raw.parse::<u64>()
        .map_err(|source| StatParseError::InvalidValue {
            value: raw.to_string(),
            line: 1,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat() {
        let data = "\
cpu  4705 356 584 3699176 23060 0 277 0 0 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 0 0
intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]
ctxt 1990473
btime 1062191376
processes 2915
";
        let stat = ProcStat::parse_str(data).unwrap();
        let cpu = stat.cpu.unwrap();
        assert_eq!(cpu.user, 4705);
        assert_eq!(cpu.idle, 3_699_176);
        assert_eq!(cpu.softirq, 277);
        assert_eq!(cpu.busy_seconds(), (4705 + 356 + 584 + 277) as f64 / 100.0);
        assert_eq!(stat.boot_time, Some(1_062_191_376));
    }

    #[test]
    fn test_parse_proc_stat_missing_btime() {
        let stat = ProcStat::parse_str("cpu 1 2 3 4\n").unwrap();
        assert_eq!(stat.boot_time, None);
        assert_eq!(stat.cpu.unwrap().irq, 0);
    }

    #[test]
    fn test_parse_start_ticks() {
        let record = "1 (systemd) S 0 1 1 0 -1 4194560 48601 1532519 99 1083 56 64 2466 1093 20 0 1 0 42 173461504 3238 18446744073709551615";
        assert_eq!(parse_start_ticks(record).unwrap(), 42);
    }

    #[test]
    fn test_parse_start_ticks_with_spaces_in_command() {
        let record = "1 (my (weird) init) S 0 1 1 0 -1 4194560 48601 1532519 99 1083 56 64 2466 1093 20 0 1 0 1234 173461504";
        assert_eq!(parse_start_ticks(record).unwrap(), 1234);
    }

    #[test]
    fn test_parse_start_ticks_truncated() {
        let err = parse_start_ticks("1 (init) S 0 1").unwrap_err();
        assert!(matches!(err, StatParseError::MissingField { .. }));

        let err = parse_start_ticks("garbage").unwrap_err();
        assert!(matches!(err, StatParseError::MissingField { .. }));
    }
}
