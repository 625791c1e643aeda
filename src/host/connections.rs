use std::path::Path;

use crate::fsutil;

/// Open socket counts from the procfs socket tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionCounts {
    pub tcp: u64,
    pub udp: u64,
    pub unix: u64,
}

/// Number of entries in a procfs socket table: non-empty lines minus the header.
pub fn count_entries(table: &str) -> u64 {
    let lines = table.lines().filter(|l| !l.trim().is_empty()).count() as u64;
    lines.saturating_sub(1)
}

async fn count_table(path: impl AsRef<Path>) -> u64 {
    fsutil::read_parsed(path, |table| Ok(count_entries(table)))
        .await
        .unwrap_or(0)
}

/// Counts TCP (v4 + v6), UDP (v4 + v6) and UNIX sockets under `<proc_root>/net`.
///
/// A missing table counts as zero.
pub async fn count_connections(proc_root: &Path) -> ConnectionCounts {
    let net = proc_root.join("net");
    let (tcp, tcp6, udp, udp6, unix) = tokio::join!(
        count_table(net.join("tcp")),
        count_table(net.join("tcp6")),
        count_table(net.join("udp")),
        count_table(net.join("udp6")),
        count_table(net.join("unix")),
    );

    ConnectionCounts {
        tcp: tcp + tcp6,
        udp: udp + udp6,
        unix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TCP: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1 1 0 100 0 0 10 0
   1: 0100007F:0CEA 0100007F:9C40 01 00000000:00000000 00:00000000 00000000  1000        0 2 1 0 20 4 30 10 -1
";

    #[test]
    fn test_count_entries() {
        assert_eq!(count_entries(TCP), 2);
        assert_eq!(count_entries("header only\n"), 0);
        assert_eq!(count_entries(""), 0);
    }

    #[tokio::test]
    async fn test_count_connections_sums_families() {
        let dir = tempfile::tempdir().unwrap();
        let net = dir.path().join("net");
        fs::create_dir_all(&net).unwrap();
        fs::write(net.join("tcp"), TCP).unwrap();
        fs::write(net.join("tcp6"), TCP).unwrap();
        fs::write(net.join("udp"), "header\nentry\n").unwrap();
        fs::write(net.join("unix"), "Num RefCount\na\nb\nc\n").unwrap();

        let counts = count_connections(dir.path()).await;
        assert_eq!(
            counts,
            ConnectionCounts {
                tcp: 4,
                udp: 1,
                unix: 3
            }
        );
    }
}
