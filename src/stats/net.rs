use std::io::BufRead;

/// Cumulative counters of one network interface, as reported in `/proc/net/dev`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceCounters {
    /// Interface name, e.g. `eth0`.
    pub name: String,
    /// Bytes received.
    pub rx_bytes: u64,
    /// Packets received.
    pub rx_packets: u64,
    /// Bytes transmitted.
    pub tx_bytes: u64,
    /// Packets transmitted.
    pub tx_packets: u64,
}

impl InterfaceCounters {
    pub fn is_loopback(&self) -> bool {
        self.name == LOOPBACK_INTERFACE
    }
}

const LOOPBACK_INTERFACE: &str = "lo";

/// All interfaces listed in `/proc/net/dev`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetDev {
    pub interfaces: Vec<InterfaceCounters>,
}

/// Splits an interface line into its name and the whitespace-separated counters.
///
/// Returns `None` if the line has no `:` separator.
fn parse_interface_line(line: &str) -> Option<(&str, impl Iterator<Item = &str>)> {
    let (iface, data) = line.trim().split_once(':')?;
    Some((iface.trim(), data.split_whitespace()))
}

/// Extracts the byte and packet counters from the 16 counter columns of a `/proc/net/dev` line.
///
/// Returns `None` if there are fewer than 16 columns. Unparsable columns count as `0`.
fn counters_from_fields<'a>(
    name: &str,
    fields: impl Iterator<Item = &'a str>,
) -> Option<InterfaceCounters> {
    let fields: Vec<&str> = fields.collect();
    if fields.len() < 16 {
        return None;
    }
    let value = |idx: usize| fields[idx].parse::<u64>().unwrap_or(0);
    Some(InterfaceCounters {
        name: name.to_owned(),
        rx_bytes: value(0),
        rx_packets: value(1),
        tx_bytes: value(8),
        tx_packets: value(9),
    })
}

impl NetDev {
    /// Parses the fixed-format `/proc/net/dev` table.
    ///
    /// The first two lines are column headers. Lines that do not look like an interface
    /// entry are skipped.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut interfaces = Vec::new();
        let mut line = String::new();

        for _ in 0..2 {
            buf.read_line(&mut line)?;
            line.clear();
        }

        while buf.read_line(&mut line)? != 0 {
            if let Some((iface, fields)) = parse_interface_line(&line) {
                if let Some(counters) = counters_from_fields(iface, fields) {
                    interfaces.push(counters);
                }
            }
            line.clear();
        }

        Ok(Self { interfaces })
    }

    pub fn parse_str(contents: &str) -> std::io::Result<Self> {
        Self::from_reader(&mut contents.as_bytes())
    }

    /// Sums received and transmitted bytes over all interfaces, optionally skipping loopback.
    ///
    /// Returns `(rx_bytes, tx_bytes)`.
    pub fn totals(&self, exclude_loopback: bool) -> (u64, u64) {
        self.interfaces
            .iter()
            .filter(|iface| !(exclude_loopback && iface.is_loopback()))
            .fold((0u64, 0u64), |(rx, tx), iface| {
                (
                    rx.saturating_add(iface.rx_bytes),
                    tx.saturating_add(iface.tx_bytes),
                )
            })
    }
}
