//! Application state for the API server

use crate::Config;
use crate::invoker::{MediaDownloader, SpotdlDownloader, YtDlpDownloader};
use crate::types::MediaKind;
use std::path::Path;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones). Holds no per-request data:
/// every request allocates and owns its own artifact.
#[derive(Clone)]
pub struct AppState {
    /// Configuration, read-only after startup
    pub config: Arc<Config>,

    /// Downloader used by `POST /api/download/youtube`
    pub youtube: Arc<dyn MediaDownloader>,

    /// Downloader used by `POST /api/download/spotify`
    pub spotify: Arc<dyn MediaDownloader>,
}

impl AppState {
    /// Create state with explicit downloaders
    pub fn new(
        config: Arc<Config>,
        youtube: Arc<dyn MediaDownloader>,
        spotify: Arc<dyn MediaDownloader>,
    ) -> Self {
        Self {
            config,
            youtube,
            spotify,
        }
    }

    /// Create state backed by the yt-dlp and spotdl binaries
    pub fn from_config(config: Arc<Config>) -> Self {
        let youtube = Arc::new(YtDlpDownloader::from_config(&config));
        let spotify = Arc::new(SpotdlDownloader::from_config(&config));

        tracing::info!(
            ytdlp = ?youtube.binary_path(),
            spotdl = ?spotify.binary_path(),
            "external tools resolved"
        );

        Self::new(config, youtube, spotify)
    }

    /// Downloader responsible for `kind`
    pub fn downloader(&self, kind: MediaKind) -> Arc<dyn MediaDownloader> {
        match kind {
            MediaKind::YouTube => self.youtube.clone(),
            MediaKind::Spotify => self.spotify.clone(),
        }
    }

    /// Directory where artifacts are created
    pub fn temp_dir(&self) -> &Path {
        &self.config.download.temp_dir
    }
}
