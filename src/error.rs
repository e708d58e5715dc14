//! Error types for audio-dl
//!
//! This module provides:
//! - The crate-wide [`Error`] enum used by configuration, the invokers and the API
//! - HTTP status code mapping for API integration ([`ToHttpStatus`])
//! - The client-facing [`ApiError`] body (`{"error": "..."}`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for audio-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for audio-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "PORT")
        key: Option<String>,
    },

    /// Request failed validation before any work was started
    #[error("{0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External tool could not be started
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// External tool ran but reported failure
    #[error("{tool} exited with {}", exit_description(.code))]
    ToolExit {
        /// Name of the tool (e.g. "spotdl")
        tool: &'static str,
        /// Exit code, `None` when the process was terminated by a signal
        code: Option<i32>,
        /// Last lines the tool wrote to stderr
        stderr: String,
    },

    /// External tool exceeded the configured wall-clock limit and was killed
    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout {
        /// Name of the tool
        tool: &'static str,
        /// Configured limit in seconds
        seconds: u64,
    },

    /// Tool exited successfully but left nothing at the destination path
    #[error("tool reported success but produced no output at {}", .path.display())]
    MissingOutput {
        /// The path the tool was asked to write
        path: PathBuf,
    },

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Client-facing error body
///
/// Every error the API returns has this shape:
///
/// ```json
/// { "error": "URL is required" }
/// ```
///
/// Internal tool diagnostics are never placed in this body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    /// Create a new API error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code (used in logs, never sent to clients)
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,

            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // Tool failures are reported to clients as a generic 500
            Error::ExternalTool(_) => 500,
            Error::ToolExit { .. } => 500,
            Error::ToolTimeout { .. } => 500,
            Error::MissingOutput { .. } => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Io(_) => "io_error",
            Error::ExternalTool(_) => "tool_invocation_failed",
            Error::ToolExit { .. } => "tool_nonzero_exit",
            Error::ToolTimeout { .. } => "tool_timeout",
            Error::MissingOutput { .. } => "missing_output",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::Validation(message) => ApiError::new(message),
            _ => ApiError::new("Internal server error"),
        }
    }
}
