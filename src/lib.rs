//! # audio-dl
//!
//! Small HTTP service that turns a YouTube or Spotify URL into an mp3
//! download.
//!
//! The heavy lifting is done by external tools: `yt-dlp` for YouTube and
//! `spotdl` for Spotify. Each request gets its own uniquely named file in the
//! temp directory; the file is streamed back as an attachment and removed
//! once the response is finished, whether the download worked or not.
//!
//! ## Quick Start
//!
//! ```no_run
//! use audio_dl::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     // Serves until SIGTERM / SIGINT
//!     audio_dl::run(config).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

use std::future::Future;
use std::sync::Arc;

/// REST API module
pub mod api;
/// Temp-file lifecycle for downloaded audio
pub mod artifact;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// External download tool invocation
pub mod invoker;
/// Core request and outcome types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DownloadConfig, ToolsConfig};
pub use error::{ApiError, Error, Result, ToHttpStatus};
pub use invoker::{MediaDownloader, SpotdlDownloader, YtDlpDownloader};
pub use types::{DownloadOutcome, DownloadRequest, MediaKind};

/// Run the service until a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run(config: Config) -> Result<()> {
    run_until(config, wait_for_signal()).await
}

/// Run the service until `shutdown` resolves.
///
/// Creates the temp directory and removes artifacts left behind by an earlier
/// run, serves the API with graceful shutdown, then sweeps the temp directory
/// once more with the same age threshold.
pub async fn run_until<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = Arc::new(config);

    artifact::prepare_temp_dir(&config.download.temp_dir).await?;
    sweep(&config, "startup").await;

    let state = api::AppState::from_config(config.clone());
    let served = api::start_api_server(state, shutdown).await;

    sweep(&config, "shutdown").await;
    served
}

async fn sweep(config: &Config, phase: &'static str) {
    let swept = artifact::sweep_stale_artifacts(
        &config.download.temp_dir,
        config.download.stale_artifact_age,
    )
    .await;
    if swept > 0 {
        tracing::info!(count = swept, phase, "removed stale artifacts");
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
