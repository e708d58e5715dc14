//! Trait for external download tools

use async_trait::async_trait;
use std::path::Path;

/// A tool that fetches remote media and writes audio to a given path
///
/// Implementations wrap an external program (yt-dlp, spotdl). The request
/// handler only sees this trait, so tests and alternative backends can be
/// swapped in through [`AppState`](crate::api::AppState).
///
/// # Examples
///
/// ```no_run
/// use audio_dl::invoker::{MediaDownloader, SpotdlDownloader};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let spotdl = SpotdlDownloader::new(PathBuf::from("spotdl"), None);
/// spotdl
///     .download(
///         "https://open.spotify.com/track/abc",
///         Path::new("/tmp/track.mp3"),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `url` and write the audio to `destination`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The tool cannot be started ([`Error::ExternalTool`](crate::Error::ExternalTool))
    /// - The tool exits unsuccessfully ([`Error::ToolExit`](crate::Error::ToolExit))
    /// - The tool exceeds its time limit ([`Error::ToolTimeout`](crate::Error::ToolTimeout))
    async fn download(&self, url: &str, destination: &Path) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
