//! Request-scoped domain types

use std::fmt;
use std::path::PathBuf;

/// Which upstream service a download targets
///
/// The kind is chosen by the endpoint that received the request, never by
/// looking at the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// YouTube video, fetched with yt-dlp
    YouTube,
    /// Spotify track, fetched with spotdl
    Spotify,
}

impl MediaKind {
    /// Message returned to the client when a download of this kind fails
    pub fn failure_message(self) -> &'static str {
        match self {
            MediaKind::YouTube => "Failed to download YouTube audio",
            MediaKind::Spotify => "Failed to download Spotify track",
        }
    }

    /// Short lowercase label used in log fields
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::YouTube => "youtube",
            MediaKind::Spotify => "spotify",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Source URL, guaranteed non-empty
    pub url: String,
    /// Upstream service
    pub kind: MediaKind,
}

impl DownloadRequest {
    /// Build a request, returning `None` when the URL is absent or blank
    pub fn new(url: Option<String>, kind: MediaKind) -> Option<Self> {
        let url = url?;
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            url: trimmed.to_string(),
            kind,
        })
    }
}

/// Result of one download attempt
///
/// Produced by an invoker and consumed once by the request handler.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The tool produced a file at the given path
    Success {
        /// Path of the produced artifact
        path: PathBuf,
    },
    /// The tool could not produce a file
    Failure {
        /// Internal diagnostic, never shown to clients
        reason: String,
    },
}

impl DownloadOutcome {
    /// Whether this outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}
