use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::Usage;

/// Upper bound for a `df` invocation; hung network mounts must not stall sampling.
pub const DF_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    #[error("failed to run `df` for `{path}`: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`df` for `{0}` timed out")]
    Timeout(PathBuf),
    #[error("`df` for `{path}` exited with {status}")]
    Failed {
        path: PathBuf,
        status: std::process::ExitStatus,
    },
    #[error("unexpected `df` output: {0:?}")]
    Unparsable(String),
}

/// Parses POSIX `df -kP` output into bytes.
///
/// Both the filesystem name and the mount point may contain spaces, so the columns are
/// located relative to the capacity field (`NN%`) that follows three numeric columns.
pub fn parse_df_output(output: &str) -> Option<Usage> {
    let line = output.lines().skip(1).find(|l| !l.trim().is_empty())?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    let numeric = |field: &str| field.parse::<u64>().ok();

    (4..fields.len()).find_map(|capacity| {
        fields[capacity].strip_suffix('%')?.parse::<u64>().ok()?;
        let blocks = numeric(fields[capacity - 3])?;
        let used = numeric(fields[capacity - 2])?;
        numeric(fields[capacity - 1])?;
        Some(Usage {
            total: blocks.saturating_mul(1024),
            used: used.saturating_mul(1024),
        })
    })
}

/// Disk usage of the filesystem mounted at `path`, measured with `df`.
///
/// # Errors
///
/// Returns a [`DiskError`] if `df` cannot be run, times out, fails, or prints something
/// unexpected.
pub async fn disk_usage(path: &Path) -> Result<Usage, DiskError> {
    let mut command = Command::new("df");
    command
        .arg("-kP")
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = tokio::time::timeout(DF_TIMEOUT, command.output())
        .await
        .map_err(|_| DiskError::Timeout(path.to_path_buf()))?
        .map_err(|source| DiskError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;
    if !output.status.success() {
        return Err(DiskError::Failed {
            path: path.to_path_buf(),
            status: output.status,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_df_output(&stdout).ok_or_else(|| DiskError::Unparsable(stdout.into_owned()))
}
