use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::payload::BasicInfo;
use super::{Error, Result};
use crate::sampler::Probe;

/// Posts one identity document.
///
/// # Errors
///
/// Returns an error if the request fails or the collector answers with a non-2xx status.
pub async fn push_basic_info(http: &reqwest::Client, url: &Url, info: &BasicInfo) -> Result<()> {
    let response = http.post(url.clone()).json(info).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }
    Ok(())
}

/// Publishes the identity subset immediately and then every `interval` until cancelled.
///
/// A failed push is logged and only retried on the next tick.
pub async fn run_identity(
    probe: Arc<Probe>,
    http: reqwest::Client,
    url: Url,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let push = async {
            let info = BasicInfo::from(probe.basic_info().await);
            push_basic_info(&http, &url, &info).await
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = push => match result {
                Ok(()) => log::debug!("identity published"),
                Err(err) => log::warn!("{err}"),
            },
        }
    }
    log::debug!("identity schedule stopped");
}
