use std::io::BufRead;

use super::{SingleLineStat, StatParseError};

/// System load averages from `/proc/loadavg`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadAverage {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

impl SingleLineStat for LoadAverage {
    /// Parses `"0.52 0.58 0.59 1/467 12345"`; only the first three columns are used.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let mut parts = line.split_whitespace();
        let mut next = |field: &'static str| -> Result<f64, StatParseError> {
            let raw = parts.next().ok_or(StatParseError::MissingField { field })?;
            raw.parse::<f64>()
                .map_err(|source| StatParseError::InvalidDecimal {
                    value: raw.to_string(),
                    source,
                })
        };

        Ok(Self {
            load1: next("load1")?,
            load5: next("load5")?,
            load15: next("load15")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loadavg() {
        let load = LoadAverage::parse_str("0.52 0.58 0.59 1/467 12345\n").unwrap();
        assert_eq!(load.load1, 0.52);
        assert_eq!(load.load5, 0.58);
        assert_eq!(load.load15, 0.59);
    }

    #[test]
    fn test_parse_truncated_loadavg() {
        let err = LoadAverage::parse_str("0.52\n").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
