use std::io;
use std::path::{Path, PathBuf};

use crate::error::ResultOkLogExt;

/// Error that occurs when reading or parsing a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read file `{path}`: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Reads the whole file at `path` into a string.
///
/// # Errors
///
/// Returns a [`FileReadError`] if the file cannot be opened or read.
pub async fn read_to_string(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FileReadError {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads an optional source file and parses its contents.
///
/// Missing, unreadable or malformed files are not errors for the agent: they are logged at
/// debug level and yield `None`.
pub async fn read_parsed<T>(
    path: impl AsRef<Path>,
    parse: impl FnOnce(&str) -> io::Result<T>,
) -> Option<T> {
    let path = path.as_ref();
    let contents = read_to_string(path).await.ok_log(log::Level::Debug)?;
    parse(&contents)
        .map_err(|source| FileReadError {
            path: path.to_path_buf(),
            source,
        })
        .ok_log(log::Level::Debug)
}

/// Like [`read_parsed`], but a `None` path (a source that was never located) is skipped
/// without touching the filesystem.
pub async fn read_parsed_opt<T>(
    path: Option<&Path>,
    parse: impl FnOnce(&str) -> io::Result<T>,
) -> Option<T> {
    read_parsed(path?, parse).await
}
