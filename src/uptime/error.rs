use crate::fsutil::FileReadError;
use crate::stats::StatParseError;

/// Errors that prevent computing the PID 1 based uptime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] FileReadError),
    #[error("malformed PID 1 stat record: {0}")]
    Record(#[from] StatParseError),
    #[error("malformed kernel statistics: {0}")]
    KernelStat(#[source] std::io::Error),
    #[error("kernel boot time missing from kernel statistics")]
    MissingBootTime,
}

pub type Result<T> = std::result::Result<T, Error>;
