//! yt-dlp wrapper used for YouTube downloads

use super::process::{STDERR_TAIL_LINES, run_collected, tail_lines};
use super::traits::MediaDownloader;
use crate::config::Config;
use crate::error::Error;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Program name looked up on PATH when no explicit path is configured
pub const YTDLP_PROGRAM: &str = "yt-dlp";

/// Runs the external `yt-dlp` binary with fixed audio-extraction options
///
/// The run is collected as a whole: stderr is only inspected once the tool
/// has exited, and its tail is attached to the error on failure.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    binary_path: PathBuf,
    timeout: Option<Duration>,
}

impl YtDlpDownloader {
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
            .resolve(config.tools.ytdlp_path.as_ref(), YTDLP_PROGRAM);
        Self::new(binary_path, config.download.tool_timeout)
    }

    /// Path of the binary this wrapper runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Arguments passed to yt-dlp for one download
    ///
    /// The URL goes after `--` so it can never be parsed as an option.
    pub fn build_args(url: &str, destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--no-check-certificates",
            "--no-warnings",
            "--prefer-free-formats",
            "--output",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(destination.as_os_str().to_os_string());
        args.push(OsString::from("--"));
        args.push(OsString::from(url));
        args
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> crate::Result<()> {
        let mut command = Command::new(&self.binary_path);
        command.args(Self::build_args(url, destination));

        tracing::debug!(tool = YTDLP_PROGRAM, url, destination = ?destination, "starting download");

        let output = run_collected(command, YTDLP_PROGRAM, self.timeout).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::ToolExit {
                tool: YTDLP_PROGRAM,
                code: output.status.code(),
                stderr: tail_lines(&output.stderr, STDERR_TAIL_LINES),
            })
        }
    }

    fn name(&self) -> &'static str {
        YTDLP_PROGRAM
    }
}
