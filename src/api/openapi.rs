//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the audio-dl REST API
///
/// Served at `/api/openapi.json`, and behind Swagger UI at
/// `/api/swagger-ui` when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "audio-dl REST API",
        version = "0.1.0",
        description = "Fetch YouTube or Spotify audio as an mp3 download",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        crate::api::routes::download_youtube,
        crate::api::routes::download_spotify,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::api::routes::DownloadBody,
            crate::api::routes::HealthStatus,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "downloads", description = "Audio downloads"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
