//! Common test utilities for audio-dl integration tests

#![allow(dead_code)]

use audio_dl::Config;
use axum::body::Body;
use axum::http::Request;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write an executable `/bin/sh` script named `name` into `dir`
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Fake yt-dlp: records its arguments, then writes `content` to the `--output` path
pub fn fake_ytdlp(dir: &Path, content: &str) -> PathBuf {
    fake_ytdlp_running(dir, &format!(r#"printf '{content}' > "$out""#))
}

/// Fake yt-dlp: records its arguments, then runs `body` with `$out` set to
/// the `--output` path
pub fn fake_ytdlp_running(dir: &Path, body: &str) -> PathBuf {
    let args_file = dir.join("ytdlp-args");
    write_script(
        dir,
        "yt-dlp",
        &format!(
            r#"printf '%s\n' "$@" > '{args}'
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output" ]; then out="$2"; shift; fi
  shift
done
{body}"#,
            args = args_file.display(),
        ),
    )
}

/// Fake spotdl: records its arguments, then runs `body` with `$3` as the output path
pub fn fake_spotdl(dir: &Path, body: &str) -> PathBuf {
    let args_file = dir.join("spotdl-args");
    write_script(
        dir,
        "spotdl",
        &format!(
            "printf '%s\\n' \"$@\" > '{args}'\n{body}",
            args = args_file.display()
        ),
    )
}

/// Arguments a fake tool was last called with, one per line
pub fn recorded_args(dir: &Path, tool: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(format!("{tool}-args")))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Temp dirs for artifacts and tool scripts, plus a config pointing at both
pub struct Sandbox {
    pub artifacts: TempDir,
    pub tools: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            artifacts: tempfile::tempdir().unwrap(),
            tools: tempfile::tempdir().unwrap(),
        }
    }

    /// Build a config the way the binary does, from environment-style keys
    pub fn config(&self, extra: &[(&str, String)]) -> Config {
        let mut vars = vec![
            ("TEMP_DIR", self.artifacts.path().display().to_string()),
            (
                "YTDLP_PATH",
                self.tools.path().join("yt-dlp").display().to_string(),
            ),
            (
                "SPOTDL_PATH",
                self.tools.path().join("spotdl").display().to_string(),
            ),
        ];
        vars.extend(extra.iter().map(|(k, v)| (*k, v.clone())));

        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    pub fn leftover_artifacts(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.artifacts.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
