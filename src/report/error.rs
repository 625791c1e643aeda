/// Errors raised by the reporting client.
///
/// None of these carry the collector URL: it embeds the access token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported endpoint `{0}`, expected an http or https URL")]
    InvalidEndpoint(String),
    #[error("failed to connect to `{target}`: {source}")]
    Connect {
        target: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("connection handshake with `{0}` timed out")]
    HandshakeTimeout(String),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("identity push failed: {0}")]
    Http(reqwest::Error),
    #[error("identity push rejected with status {0}")]
    Status(reqwest::StatusCode),
    #[error("identity task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
