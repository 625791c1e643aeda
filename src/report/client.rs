use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::time::{Interval, MissedTickBehavior, Sleep};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::identity::run_identity;
use super::payload::Report;
use super::state::{Action, ConnectionState, Event, transition};
use super::{Error, Result};
use crate::sampler::{MetricsSampler, Probe};

/// Upper bound for the WebSocket handshake. A timeout counts as a failed connect.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Collector endpoint and schedules.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Collector base URL (`http` or `https`).
    pub endpoint: Url,
    pub token: String,
    pub report_interval: Duration,
    pub info_interval: Duration,
    pub reconnect_delay: Duration,
    /// Log every Nth streamed payload; `0` disables.
    pub log_every: u64,
    /// Log inbound frames at `info` instead of `debug`.
    pub log_inbound: bool,
}

fn api_url(endpoint: &Url, leaf: &str, token: &str) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| Error::InvalidEndpoint(redact(endpoint)))?
        .pop_if_empty()
        .extend(["api", "clients", leaf]);
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// `POST` target for identity documents.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] unless the endpoint is an http(s) URL.
pub fn basic_info_url(endpoint: &Url, token: &str) -> Result<Url> {
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(Error::InvalidEndpoint(redact(endpoint)));
    }
    api_url(endpoint, "uploadBasicInfo", token)
}

/// WebSocket target for streamed reports: the endpoint with `ws`/`wss` in place of
/// `http`/`https`.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] unless the endpoint is an http(s) URL.
pub fn report_url(endpoint: &Url, token: &str) -> Result<Url> {
    let scheme = match endpoint.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(Error::InvalidEndpoint(redact(endpoint))),
    };
    let mut url = api_url(endpoint, "report", token)?;
    url.set_scheme(scheme)
        .map_err(|()| Error::InvalidEndpoint(redact(endpoint)))?;
    Ok(url)
}

/// The URL without query, for logs and errors.
pub fn redact(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.port().map(|p| format!(":{p}")).unwrap_or_default()
    ) + url.path()
}

enum Dialed {
    Open(Box<WsStream>),
    Failed(Error),
    Cancelled,
}

async fn dial(url: &Url, cancel: &CancellationToken) -> Dialed {
    let target = redact(url);
    let handshake = tokio::time::timeout(
        HANDSHAKE_TIMEOUT,
        tokio_tungstenite::connect_async(url.as_str()),
    );
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Dialed::Cancelled,
        result = handshake => match result {
            Ok(Ok((socket, _))) => Dialed::Open(Box::new(socket)),
            Ok(Err(source)) => Dialed::Failed(Error::Connect { target, source }),
            Err(_) => Dialed::Failed(Error::HandshakeTimeout(target)),
        },
    }
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn elapsed(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn next_frame(socket: &mut Option<Box<WsStream>>) -> Option<tungstenite::Result<Message>> {
    match socket {
        Some(socket) => socket.next().await,
        None => std::future::pending().await,
    }
}

enum Wake {
    Stop,
    Push,
    Frame(Option<tungstenite::Result<Message>>),
    Reconnect,
}

/// Streams snapshots over a self-healing WebSocket and publishes identity documents.
pub struct ReportingClient {
    config: ClientConfig,
    report_url: Url,
    info_url: Url,
    http: reqwest::Client,
    sampler: MetricsSampler,
    state: ConnectionState,
    pending: VecDeque<Event>,
    socket: Option<Box<WsStream>>,
    push_timer: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
    sequence: u64,
}

impl ReportingClient {
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an http(s) URL or the HTTP client cannot be
    /// built.
    pub fn new(config: ClientConfig, probe: Arc<Probe>) -> Result<Self> {
        let report_url = report_url(&config.endpoint, &config.token)?;
        let info_url = basic_info_url(&config.endpoint, &config.token)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ReportingClient {
            config,
            report_url,
            info_url,
            http,
            sampler: MetricsSampler::new(probe),
            state: ConnectionState::Disconnected,
            pending: VecDeque::new(),
            socket: None,
            push_timer: None,
            reconnect: None,
            sequence: 0,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Runs both schedules until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Task`] if the identity task panicked.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let identity = tokio::spawn(run_identity(
            Arc::clone(self.sampler.probe()),
            self.http.clone(),
            self.info_url.clone(),
            self.config.info_interval,
            cancel.clone(),
        ));

        self.stream(&cancel).await;
        identity.await?;
        log::info!("reporting stopped");
        Ok(())
    }

    async fn stream(&mut self, cancel: &CancellationToken) {
        self.pending.push_back(Event::Dial);
        loop {
            while let Some(event) = self.pending.pop_front() {
                let (next, actions) = transition(self.state, event);
                if next != self.state {
                    log::debug!("connection {:?} -> {:?} on {:?}", self.state, next, event);
                }
                self.state = next;
                for action in actions {
                    self.apply(action, cancel).await;
                }
                if event == Event::Stop {
                    return;
                }
            }

            let wake = tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Stop,
                _ = tick(&mut self.push_timer) => Wake::Push,
                frame = next_frame(&mut self.socket) => Wake::Frame(frame),
                _ = elapsed(&mut self.reconnect) => Wake::Reconnect,
            };
            match wake {
                Wake::Stop => self.pending.push_back(Event::Stop),
                Wake::Push => self.push().await,
                Wake::Frame(frame) => self.on_frame(frame),
                Wake::Reconnect => {
                    self.reconnect = None;
                    self.pending.push_back(Event::Dial);
                }
            }
        }
    }

    async fn apply(&mut self, action: Action, cancel: &CancellationToken) {
        match action {
            Action::Dial => match dial(&self.report_url, cancel).await {
                Dialed::Open(socket) => {
                    log::info!("connected to {}", redact(&self.report_url));
                    self.socket = Some(socket);
                    self.pending.push_back(Event::Connected);
                }
                Dialed::Failed(err) => {
                    log::warn!("{err}");
                    self.pending.push_back(Event::ConnectFailed);
                }
                Dialed::Cancelled => self.pending.push_back(Event::Stop),
            },
            Action::StartPushTimer => {
                let mut timer = tokio::time::interval(self.config.report_interval);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.push_timer = Some(timer);
            }
            Action::StopPushTimer => self.push_timer = None,
            Action::ScheduleReconnect => {
                log::info!("reconnecting in {:?}", self.config.reconnect_delay);
                self.reconnect = Some(Box::pin(tokio::time::sleep(self.config.reconnect_delay)));
            }
            Action::CloseTransport => {
                if let Some(mut socket) = self.socket.take() {
                    if let Err(err) = WebSocketStream::close(&mut socket, None).await {
                        log::debug!("closing connection: {err}");
                    }
                }
            }
        }
    }

    /// Samples and sends one report. Without an open connection this only logs.
    async fn push(&mut self) {
        if self.socket.is_none() {
            log::debug!("no open connection, skipping report");
            return;
        }

        let snapshot = self.sampler.snapshot().await;
        let frame = match serde_json::to_string(&Report::from_snapshot(&snapshot)) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("{}", Error::Encode(err));
                return;
            }
        };
        self.sequence += 1;
        if self.config.log_every > 0 && self.sequence % self.config.log_every == 0 {
            log::info!("report #{}: {frame}", self.sequence);
        }

        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        if let Err(err) = socket.send(Message::text(frame)).await {
            log::warn!("failed to send report #{}: {err}", self.sequence);
            self.pending.push_back(Event::Closed);
        }
    }

    fn on_frame(&mut self, frame: Option<tungstenite::Result<Message>>) {
        match frame {
            Some(Ok(Message::Text(text))) => {
                if self.config.log_inbound {
                    log::info!("inbound: {}", text.as_str());
                } else {
                    log::debug!("inbound: {}", text.as_str());
                }
            }
            Some(Ok(Message::Binary(data))) => {
                log::debug!("inbound binary frame of {} bytes", data.len());
            }
            Some(Ok(Message::Close(reason))) => {
                log::info!("collector closed the connection: {reason:?}");
                self.pending.push_back(Event::Closed);
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                log::warn!("connection error: {err}");
                self.pending.push_back(Event::Closed);
            }
            None => {
                log::info!("connection closed");
                self.pending.push_back(Event::Closed);
            }
        }
    }
}
