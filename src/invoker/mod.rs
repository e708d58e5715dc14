//! External download tool invocation
//!
//! Every tool sits behind the [`MediaDownloader`] trait:
//!
//! - [`YtDlpDownloader`]: runs `yt-dlp` and collects its output (YouTube)
//! - [`SpotdlDownloader`]: runs `spotdl` and streams its stderr into the log (Spotify)
//!
//! [`invoke`] turns whatever a tool does into a single [`DownloadOutcome`],
//! logging the detailed cause. Callers only see success or an opaque failure.

mod process;
mod spotdl;
mod traits;
mod ytdlp;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use spotdl::{SPOTDL_PROGRAM, SpotdlDownloader};
pub use traits::MediaDownloader;
pub use ytdlp::{YTDLP_PROGRAM, YtDlpDownloader};

use crate::error::{Error, ToHttpStatus};
use crate::types::{DownloadOutcome, DownloadRequest};
use std::path::Path;

/// Run `downloader` for `request` and normalize the result
///
/// A tool that exits successfully without leaving a file at `destination`
/// is treated as a failure.
pub async fn invoke(
    downloader: &dyn MediaDownloader,
    request: &DownloadRequest,
    destination: &Path,
) -> DownloadOutcome {
    let result = match downloader.download(&request.url, destination).await {
        Ok(()) => match tokio::fs::metadata(destination).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            _ => Err(Error::MissingOutput {
                path: destination.to_path_buf(),
            }),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!(
                kind = %request.kind,
                tool = downloader.name(),
                path = ?destination,
                "download complete"
            );
            DownloadOutcome::Success {
                path: destination.to_path_buf(),
            }
        }
        Err(e) => {
            let stderr = match &e {
                Error::ToolExit { stderr, .. } => stderr.as_str(),
                _ => "",
            };
            tracing::error!(
                kind = %request.kind,
                tool = downloader.name(),
                url = %request.url,
                code = e.error_code(),
                error = %e,
                stderr,
                "download failed"
            );
            DownloadOutcome::Failure {
                reason: e.to_string(),
            }
        }
    }
}
