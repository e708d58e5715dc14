//! spotdl wrapper used for Spotify downloads

use super::process::run_streamed;
use super::traits::MediaDownloader;
use crate::config::Config;
use crate::error::Error;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Program name looked up on PATH when no explicit path is configured
pub const SPOTDL_PROGRAM: &str = "spotdl";

/// Runs the external `spotdl` binary as `spotdl <url> --output <path>`
///
/// stderr is streamed into the log while the tool runs; none of it reaches
/// the client.
#[derive(Debug, Clone)]
pub struct SpotdlDownloader {
    binary_path: PathBuf,
    timeout: Option<Duration>,
}

impl SpotdlDownloader {
    /// Create a wrapper around an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Create a wrapper using the configured (or discovered) binary
    pub fn from_config(config: &Config) -> Self {
        let binary_path = config
            .tools
            .resolve(config.tools.spotdl_path.as_ref(), SPOTDL_PROGRAM);
        Self::new(binary_path, config.download.tool_timeout)
    }

    /// Path of the binary this wrapper runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Arguments passed to spotdl for one download
    pub fn build_args(url: &str, destination: &Path) -> Vec<OsString> {
        vec![
            OsString::from(url),
            OsString::from("--output"),
            destination.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl MediaDownloader for SpotdlDownloader {
    async fn download(&self, url: &str, destination: &Path) -> crate::Result<()> {
        let mut command = Command::new(&self.binary_path);
        command.args(Self::build_args(url, destination));

        tracing::debug!(tool = SPOTDL_PROGRAM, url, destination = ?destination, "starting download");

        let (status, stderr) = run_streamed(command, SPOTDL_PROGRAM, self.timeout).await?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolExit {
                tool: SPOTDL_PROGRAM,
                code: status.code(),
                stderr,
            })
        }
    }

    fn name(&self) -> &'static str {
        SPOTDL_PROGRAM
    }
}
