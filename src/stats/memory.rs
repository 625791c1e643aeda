//! Memory accounting files for both cgroup generations.
//!
//! Usage files (`memory.current`, `memory.swap.current`, `memory.usage_in_bytes`,
//! `memory.memsw.usage_in_bytes`) hold one byte count and parse into [`MemoryUsage`].
//! Limit files (`memory.max`, `memory.swap.max`, `memory.limit_in_bytes`,
//! `memory.memsw.limit_in_bytes`) parse into [`MemoryLimit`], where both the v2 keyword
//! `max` and the v1 "no limit" value (`LONG_MAX` rounded down to a page) mean unbounded.

use std::io::BufRead;

use super::SingleLineStat;
use super::parser::read_single_value;

/// cgroup v1 reports an unset limit as `LONG_MAX` rounded to the page size, e.g.
/// `9223372036854771712`. Anything at or above 2^62 is treated as unbounded.
pub const V1_UNBOUNDED_THRESHOLD: u64 = 1 << 62;

/// A single byte counter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    /// # Errors
    ///
    /// Returns an error of kind `InvalidData` if the value is not an unsigned integer.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            usage_bytes: read_single_value(buf)?,
        })
    }
}

/// A byte limit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryLimit {
    /// `None` means unbounded (or unreadable, which callers treat the same way).
    pub limit_bytes: Option<u64>,
}

impl SingleLineStat for MemoryLimit {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let limit_bytes = match line.trim() {
            "max" => None,
            value => value
                .parse::<u64>()
                .ok()
                .filter(|&limit| limit < V1_UNBOUNDED_THRESHOLD),
        };

        Ok(Self { limit_bytes })
    }
}
