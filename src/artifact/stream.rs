//! Response body that owns the artifact it streams

use super::{SwallowedStage, TempArtifact, report_swallowed};
use axum::body::Bytes;
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Streams an artifact to the client and deletes it afterwards
///
/// The artifact is unlinked when the body is dropped, which hyper does both
/// after the last chunk is written and when the client goes away mid-transfer.
/// An incomplete transfer is reported as a swallowed transmission error.
pub struct ArtifactBody {
    // Declared before `artifact` so the file handle closes before the unlink
    inner: ReaderStream<File>,
    artifact: TempArtifact,
    sent: u64,
    expected: u64,
    finished: bool,
}

impl ArtifactBody {
    /// Open the artifact for streaming
    ///
    /// On failure the artifact is handed back so the caller decides how to
    /// clean it up.
    pub async fn open(artifact: TempArtifact) -> Result<Self, (TempArtifact, io::Error)> {
        let file = match File::open(artifact.path()).await {
            Ok(file) => file,
            Err(e) => return Err((artifact, e)),
        };
        let expected = match file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(e) => return Err((artifact, e)),
        };

        Ok(Self {
            inner: ReaderStream::new(file),
            artifact,
            sent: 0,
            expected,
            finished: false,
        })
    }

    /// Size of the artifact in bytes
    pub fn len(&self) -> u64 {
        self.expected
    }

    /// Whether the artifact is empty
    pub fn is_empty(&self) -> bool {
        self.expected == 0
    }

    /// File name of the underlying artifact
    pub fn file_name(&self) -> &str {
        self.artifact.file_name()
    }
}

impl Stream for ArtifactBody {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                report_swallowed(SwallowedStage::Transmission, this.artifact.path(), &e);
                // Already reported; don't report again on drop
                this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ArtifactBody {
    fn drop(&mut self) {
        if !self.finished {
            let error = io::Error::new(
                io::ErrorKind::ConnectionAborted,
                format!(
                    "response dropped after {} of {} bytes",
                    self.sent, self.expected
                ),
            );
            report_swallowed(SwallowedStage::Transmission, self.artifact.path(), &error);
        } else {
            tracing::debug!(
                path = ?self.artifact.path(),
                bytes = self.sent,
                "artifact sent"
            );
        }
    }
}
