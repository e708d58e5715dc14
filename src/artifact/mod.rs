//! Temporary artifact ownership and cleanup
//!
//! A [`TempArtifact`] owns one path in the temp directory from the moment a
//! request allocates it. Dropping the artifact (or calling
//! [`TempArtifact::cleanup`]) unlinks the file and every companion the tool
//! derived from its name, so every exit path of a request deletes what the
//! external tool wrote. Deletion failures never
//! reach the client; they go through [`report_swallowed`].

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

pub mod naming;
mod stream;
mod sweep;

pub use stream::ArtifactBody;
pub use sweep::sweep_stale_artifacts;

/// Where a swallowed error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwallowedStage {
    /// Sending the artifact to the client failed or was cut short
    Transmission,
    /// Unlinking an artifact failed
    Cleanup,
    /// The startup sweep could not inspect or remove an entry
    Sweep,
}

impl SwallowedStage {
    fn as_str(self) -> &'static str {
        match self {
            SwallowedStage::Transmission => "transmission",
            SwallowedStage::Cleanup => "cleanup",
            SwallowedStage::Sweep => "sweep",
        }
    }
}

/// Single sink for errors that are logged but never surfaced to clients
///
/// A missing file is expected (the tool may never have created it) and is
/// logged at debug level; anything else is a warning.
pub fn report_swallowed(stage: SwallowedStage, path: &Path, error: &io::Error) {
    if error.kind() == io::ErrorKind::NotFound {
        tracing::debug!(stage = stage.as_str(), path = ?path, error = %error, "swallowed error");
    } else {
        tracing::warn!(stage = stage.as_str(), path = ?path, error = %error, "swallowed error");
    }
}

/// Create the temp directory if it does not exist
pub async fn prepare_temp_dir(temp_dir: &Path) -> crate::Result<()> {
    tokio::fs::create_dir_all(temp_dir).await?;
    tracing::debug!(path = ?temp_dir, "temp directory ready");
    Ok(())
}

/// Exclusively owned temporary output file
///
/// The file itself is created by the external tool; this guard owns the path
/// plus every companion the tool derives from it (`.part` downloads,
/// intermediate containers) and guarantees they are unlinked exactly once.
#[derive(Debug)]
pub struct TempArtifact {
    dir: PathBuf,
    path: PathBuf,
    file_name: String,
    stem: String,
    removed: bool,
}

impl TempArtifact {
    /// Allocate a fresh artifact path inside `temp_dir`
    pub fn allocate(temp_dir: &Path) -> Self {
        let file_name = naming::generate_file_name();
        let stem = match naming::split_stem(&file_name) {
            Some((stem, _)) => stem.to_string(),
            None => file_name.clone(),
        };
        Self {
            dir: temp_dir.to_path_buf(),
            path: temp_dir.join(&file_name),
            file_name,
            stem,
            removed: false,
        }
    }

    /// Full path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, used for the download's Content-Disposition
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Unlink the artifact and its companions now
    pub async fn cleanup(mut self) {
        self.removed = true;
        log_removal(&self.path, tokio::fs::remove_file(&self.path).await);

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                report_swallowed(SwallowedStage::Cleanup, &self.dir, &e);
                return;
            }
        };
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if !self.is_leftover(&entry.file_name()) {
                        continue;
                    }
                    let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
                    if is_file {
                        let path = entry.path();
                        log_removal(&path, tokio::fs::remove_file(&path).await);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    report_swallowed(SwallowedStage::Cleanup, &self.dir, &e);
                    break;
                }
            }
        }
    }

    /// Companion file written by the tool, other than the artifact itself
    fn is_leftover(&self, name: &OsStr) -> bool {
        name.to_str()
            .is_some_and(|name| name != self.file_name && naming::is_companion(name, &self.stem))
    }
}

// Runs synchronously, also on runtime worker threads: a directory scan and a
// few unlinks. Callers observe the files gone as soon as the guard is dropped.
impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        log_removal(&self.path, std::fs::remove_file(&self.path));

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                report_swallowed(SwallowedStage::Cleanup, &self.dir, &e);
                return;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report_swallowed(SwallowedStage::Cleanup, &self.dir, &e);
                    break;
                }
            };
            if self.is_leftover(&entry.file_name())
                && entry.file_type().is_ok_and(|t| t.is_file())
            {
                let path = entry.path();
                log_removal(&path, std::fs::remove_file(&path));
            }
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(path = ?path, "removed artifact"),
        Err(e) => report_swallowed(SwallowedStage::Cleanup, path, &e),
    }
}
