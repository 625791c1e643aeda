use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;

use crate::stats::{KeyValueStat, ProcessStatus};

/// Maximum number of `status` reads in flight during a process scan.
pub const SCAN_WORKERS: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessCounts {
    pub processes: u64,
    pub threads: u64,
}

impl std::ops::Add for ProcessCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        ProcessCounts {
            processes: self.processes + rhs.processes,
            threads: self.threads + rhs.threads,
        }
    }
}

async fn list_process_dirs(proc_root: &Path) -> Vec<PathBuf> {
    let mut entries = match tokio::fs::read_dir(proc_root).await {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("failed to list `{}`: {err}", proc_root.display());
            return Vec::new();
        }
    };

    let mut dirs = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name();
                let is_pid = name
                    .to_str()
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
                if is_pid {
                    dirs.push(entry.path());
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::debug!("failed to list `{}`: {err}", proc_root.display());
                break;
            }
        }
    }
    dirs
}

/// Counts processes and their threads under `proc_root`.
///
/// A fixed pool of `workers` futures pulls entries from a shared index, so at most
/// `workers` reads are in flight. Processes that exit between listing and reading are
/// skipped.
pub async fn scan_processes(proc_root: &Path, workers: usize) -> ProcessCounts {
    let dirs = list_process_dirs(proc_root).await;
    let next = AtomicUsize::new(0);
    let workers = workers.clamp(1, dirs.len().max(1));

    let (dirs, next) = (&dirs, &next);
    let results = join_all((0..workers).map(|_| async move {
        let mut counts = ProcessCounts::default();
        loop {
            let idx = next.fetch_add(1, Ordering::Relaxed);
            let Some(dir) = dirs.get(idx) else {
                break counts;
            };
            let Ok(contents) = tokio::fs::read_to_string(dir.join("status")).await else {
                continue;
            };
            let threads = ProcessStatus::parse_str(&contents)
                .map(|status| status.threads)
                .unwrap_or(0);
            counts.processes += 1;
            counts.threads += threads;
        }
    }))
    .await;

    results.into_iter().fold(ProcessCounts::default(), |acc, c| acc + c)
}
