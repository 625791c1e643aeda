//! Generic parsers for the line-oriented files exposed by procfs and the cgroup filesystem.
//!
//! Two shapes cover nearly every file the agent reads:
//!
//! - [`KeyValueStat`]: one `key value` pair per line, e.g. `cpu.stat`, `/proc/meminfo`
//!   (`MemTotal:  16318412 kB`) or `/proc/<pid>/status` (`Threads:\t4`). Only keys with a
//!   registered handler are parsed; everything else is skipped.
//! - [`SingleLineStat`]: a single value on the first line, e.g. `memory.current` or `cpu.max`.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::OnceLock;
//! use creo_agent::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Threads {
//!     count: u64,
//! }
//!
//! static HANDLERS: OnceLock<HashMap<&'static str, fn(&mut Threads, u64)>> = OnceLock::new();
//!
//! impl KeyValueStat for Threads {
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         HANDLERS.get_or_init(|| {
//!             let mut map = HashMap::new();
//!             map.insert("Threads:", (|s: &mut Threads, v: u64| s.count = v) as fn(&mut Threads, u64));
//!             map
//!         })
//!     }
//! }
//!
//! let threads = Threads::parse_str("Name:\tbash\nThreads:\t4\n").unwrap();
//! assert_eq!(threads.count, 4);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::num::ParseIntError;
use std::str::FromStr;

use super::StatParseError;

/// A stat file made of `key value [unit]` lines.
///
/// The key is the first whitespace-separated token on a line (including any trailing `:`),
/// the value is the second token. Trailing tokens such as a `kB` unit are ignored.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `false`, a key that appears twice is rejected with [`StatParseError::DuplicateField`]
    /// and parsing stops early once every registered key has been seen.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Known keys and the setters that store their values.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses a key-value formatted buffer.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails, or a [`StatParseError`] wrapped in an
    /// `io::Error` of kind `InvalidData` if a registered key carries a malformed value.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                if let Some((k, handler)) = handlers.get_key_value(key) {
                    let parsed =
                        val.parse::<u64>()
                            .map_err(|source| StatParseError::InvalidKeyValue {
                                key: key.to_string(),
                                value: val.to_string(),
                                line: lineno,
                                source,
                            })?;
                    if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(*k) {
                        return Err(StatParseError::DuplicateField {
                            field: key.to_string(),
                            line: lineno,
                        }
                        .into());
                    }
                    handler(&mut stat, parsed);
                }
            }

            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == handlers.len() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }

    /// Parses already loaded file contents.
    fn parse_str(contents: &str) -> std::io::Result<Self> {
        Self::from_reader(&mut contents.as_bytes())
    }
}

/// A stat file holding a single value on its first line, such as `memory.current` or `cpu.max`.
pub trait SingleLineStat: Sized + Default {
    /// Parses the first line of the provided reader.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;

    /// Parses already loaded file contents.
    fn parse_str(contents: &str) -> std::io::Result<Self> {
        Self::from_reader(&mut contents.as_bytes())
    }
}

/// Reads the first line and parses it, trimmed, as a single integer.
///
/// # Errors
///
/// Returns [`StatParseError::InvalidValue`] (as `InvalidData`) if the line is not an integer.
pub(crate) fn read_single_value<R, T>(buf: &mut R) -> std::io::Result<T>
where
    R: BufRead,
    T: FromStr<Err = ParseIntError>,
{
    let mut line = String::new();
    buf.read_line(&mut line)?;
    let line = line.trim();
    let value = line
        .parse::<T>()
        .map_err(|source| StatParseError::InvalidValue {
            value: line.to_string(),
            line: 1,
            source,
        })?;
    Ok(value)
}
