use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use super::{Error, Result};

/// Well-known public resolvers; only used to pick a route, nothing is ever sent.
const IPV4_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);
const IPV6_PROBE: SocketAddr = SocketAddr::new(
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
    53,
);

/// Returns the source address the kernel would use to reach `target`.
///
/// Connecting a UDP socket only performs the route lookup, so no packet leaves the host.
///
/// # Errors
///
/// Returns an error if there is no route to `target` or the socket cannot be created.
pub async fn outbound_addr(target: SocketAddr) -> Result<IpAddr> {
    let bind: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(bind)
        .await
        .map_err(|source| Error::Bind { addr: bind, source })?;
    socket
        .connect(target)
        .await
        .map_err(|source| Error::Route { target, source })?;
    let local = socket.local_addr().map_err(Error::LocalAddr)?;
    Ok(local.ip())
}

/// Local IPv4 and IPv6 addresses as strings, empty when there is no route.
pub async fn detect_addresses() -> (String, String) {
    let (v4, v6) = tokio::join!(outbound_addr(IPV4_PROBE), outbound_addr(IPV6_PROBE));
    (format_addr(v4), format_addr(v6))
}

fn format_addr(addr: Result<IpAddr>) -> String {
    match addr {
        Ok(ip) if !ip.is_unspecified() => ip.to_string(),
        Ok(_) => String::new(),
        Err(err) => {
            log::debug!("{err}");
            String::new()
        }
    }
}
