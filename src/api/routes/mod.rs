//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`]: YouTube and Spotify audio downloads
//! - [`system`]: Health and OpenAPI

use serde::{Deserialize, Serialize};

mod downloads;
mod system;

pub use downloads::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/download/youtube and POST /api/download/spotify
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadBody {
    /// Media URL to download. Required and non-empty.
    #[serde(default)]
    pub url: Option<String>,
}

/// Response for GET /api/health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthStatus {
    /// Always "ok"
    pub status: String,
}
