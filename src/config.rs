//! Configuration types for audio-dl
//!
//! Configuration is built once at process start (usually with
//! [`Config::from_env`]) and handed to the API bootstrap. Request handlers
//! never read the environment themselves.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener and cross-origin settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Temp directory and tool run limits
    #[serde(default)]
    pub download: DownloadConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener to (default: 0.0.0.0:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Allowed CORS origins; "*" or an empty list allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /api/swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory holding in-flight artifacts (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Wall-clock limit for one tool run; `None` waits forever (default: 10 minutes)
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout: Option<Duration>,

    /// Artifacts older than this are removed by the startup sweep (default: 24 hours)
    #[serde(default = "default_stale_artifact_age")]
    pub stale_artifact_age: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            tool_timeout: default_tool_timeout(),
            stale_artifact_age: default_stale_artifact_age(),
        }
    }
}

/// External tool paths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to the spotdl executable (auto-detected if None)
    #[serde(default)]
    pub spotdl_path: Option<PathBuf>,

    /// Whether to search PATH for binaries if explicit paths are not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            spotdl_path: None,
            search_path: true,
        }
    }
}

impl ToolsConfig {
    /// Resolve the program to run for a tool
    ///
    /// Explicit path first, then a PATH lookup, then the bare program name so
    /// that a missing tool surfaces as a spawn failure at request time.
    pub fn resolve(&self, explicit: Option<&PathBuf>, program: &str) -> PathBuf {
        if let Some(path) = explicit {
            return path.clone();
        }
        if self.search_path {
            if let Ok(found) = which::which(program) {
                return found;
            }
            tracing::warn!(program, "tool not found in PATH");
        }
        PathBuf::from(program)
    }
}

impl Config {
    /// Build configuration from process environment variables
    ///
    /// Loads a `.env` file first if one exists.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = ?path, "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Recognized keys: `HOST`, `PORT`, `ALLOWED_ORIGIN`, `TEMP_DIR`,
    /// `DOWNLOAD_TIMEOUT_SECS` (0 disables), `STALE_ARTIFACT_MAX_AGE_SECS`,
    /// `YTDLP_PATH`, `SPOTDL_PATH`, `SWAGGER_UI`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        let host = match get("HOST") {
            Some(host) => parse_key::<IpAddr>("HOST", &host)?,
            None => config.api.bind_address.ip(),
        };
        let port = match get("PORT") {
            Some(port) => parse_key::<u16>("PORT", &port)?,
            None => config.api.bind_address.port(),
        };
        config.api.bind_address = SocketAddr::new(host, port);

        if let Some(origins) = get("ALLOWED_ORIGIN") {
            config.api.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(flag) = get("SWAGGER_UI") {
            config.api.swagger_ui = parse_key::<bool>("SWAGGER_UI", &flag)?;
        }

        if let Some(dir) = get("TEMP_DIR") {
            config.download.temp_dir = PathBuf::from(dir);
        }

        if let Some(secs) = get("DOWNLOAD_TIMEOUT_SECS") {
            let secs = parse_key::<u64>("DOWNLOAD_TIMEOUT_SECS", &secs)?;
            config.download.tool_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(secs) = get("STALE_ARTIFACT_MAX_AGE_SECS") {
            let secs = parse_key::<u64>("STALE_ARTIFACT_MAX_AGE_SECS", &secs)?;
            config.download.stale_artifact_age = Duration::from_secs(secs);
        }

        config.tools.ytdlp_path = get("YTDLP_PATH").map(PathBuf::from);
        config.tools.spotdl_path = get("SPOTDL_PATH").map(PathBuf::from);

        Ok(config)
    }
}

fn parse_key<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| Error::Config {
        message: format!("invalid value {value:?} for {key}: {e}"),
        key: Some(key.to_string()),
    })
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000)
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_tool_timeout() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

fn default_stale_artifact_age() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_true() -> bool {
    true
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api.bind_address.port(), 3000);
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.swagger_ui);
        assert_eq!(config.download.temp_dir, PathBuf::from("./temp"));
        assert_eq!(config.download.tool_timeout, Some(Duration::from_secs(600)));
        assert_eq!(
            config.download.stale_artifact_age,
            Duration::from_secs(86_400)
        );
        assert!(config.tools.ytdlp_path.is_none());
        assert!(config.tools.spotdl_path.is_none());
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("ALLOWED_ORIGIN", "http://a.test, http://b.test"),
            ("TEMP_DIR", "/var/tmp/audio"),
            ("DOWNLOAD_TIMEOUT_SECS", "30"),
            ("STALE_ARTIFACT_MAX_AGE_SECS", "60"),
            ("SPOTDL_PATH", "/opt/spotdl"),
            ("SWAGGER_UI", "true"),
        ]))
        .unwrap();

        assert_eq!(
            config.api.bind_address,
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            config.api.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(config.api.swagger_ui);
        assert_eq!(config.download.temp_dir, PathBuf::from("/var/tmp/audio"));
        assert_eq!(config.download.tool_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.download.stale_artifact_age, Duration::from_secs(60));
        assert_eq!(config.tools.spotdl_path, Some(PathBuf::from("/opt/spotdl")));
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let config = Config::from_lookup(lookup_from(&[("DOWNLOAD_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.download.tool_timeout, None);
    }

    #[test]
    fn test_invalid_port_names_the_key() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();

        match err {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("PORT"));
                assert!(message.contains("not-a-port"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "  "), ("TEMP_DIR", "")])).unwrap();
        assert_eq!(config.api.bind_address.port(), 3000);
        assert_eq!(config.download.temp_dir, PathBuf::from("./temp"));
    }

    #[test]
    fn test_explicit_tool_path_wins() {
        let tools = ToolsConfig {
            spotdl_path: Some(PathBuf::from("/custom/spotdl")),
            ..Default::default()
        };
        assert_eq!(
            tools.resolve(tools.spotdl_path.as_ref(), "spotdl"),
            PathBuf::from("/custom/spotdl")
        );
    }

    #[test]
    fn test_missing_tool_falls_back_to_program_name() {
        let tools = ToolsConfig::default();
        assert_eq!(
            tools.resolve(None, "nonexistent-audio-dl-tool-xyz"),
            PathBuf::from("nonexistent-audio-dl-tool-xyz")
        );
    }
}
