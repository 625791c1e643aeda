use std::net::SocketAddr;

/// Errors raised while discovering host facts that have no file-based fallback.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind UDP socket on `{addr}`: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("no route to `{target}`: {source}")]
    Route {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read local socket address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
