use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Entry point for the Creo agent.
///
/// Reads the configuration from `AGENT_*` environment variables and reports until SIGINT
/// or SIGTERM.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the agent fails unexpectedly.
///
/// # Examples
///
/// ```bash
/// AGENT_ENDPOINT=https://collector.example.com AGENT_TOKEN=s3cr3t RUST_LOG=info cargo run
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = creo_agent::Config::from_env()?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => log::info!("received SIGINT, shutting down"),
                _ = sigterm.recv() => log::info!("received SIGTERM, shutting down"),
            }
            cancel.cancel();
        });
    }

    creo_agent::run(config, cancel).await?;
    Ok(())
}
