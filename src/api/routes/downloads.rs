//! Download handlers.
//!
//! Each request walks the same path: validate, allocate an artifact, run the
//! tool for the endpoint's media kind, then either stream the artifact back
//! or answer 500. The artifact is deleted on every path.

use super::DownloadBody;
use crate::api::AppState;
use crate::artifact::{ArtifactBody, SwallowedStage, TempArtifact, naming, report_swallowed};
use crate::error::{ApiError, Error};
use crate::invoker;
use crate::types::{DownloadOutcome, DownloadRequest, MediaKind};
use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Message returned when the body has no usable `url`
pub const URL_REQUIRED: &str = "URL is required";

/// POST /api/download/youtube - Download YouTube audio as mp3
#[utoipa::path(
    post,
    path = "/api/download/youtube",
    tag = "downloads",
    request_body = DownloadBody,
    responses(
        (status = 200, description = "Audio file as an attachment", content_type = "audio/mpeg"),
        (status = 400, description = "URL missing or empty", body = ApiError),
        (status = 500, description = "yt-dlp failed", body = ApiError)
    )
)]
pub async fn download_youtube(
    State(state): State<AppState>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Response {
    handle_download(state, MediaKind::YouTube, body).await
}

/// POST /api/download/spotify - Download a Spotify track as mp3
#[utoipa::path(
    post,
    path = "/api/download/spotify",
    tag = "downloads",
    request_body = DownloadBody,
    responses(
        (status = 200, description = "Audio file as an attachment", content_type = "audio/mpeg"),
        (status = 400, description = "URL missing or empty", body = ApiError),
        (status = 500, description = "spotdl failed", body = ApiError)
    )
)]
pub async fn download_spotify(
    State(state): State<AppState>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Response {
    handle_download(state, MediaKind::Spotify, body).await
}

async fn handle_download(
    state: AppState,
    kind: MediaKind,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Response {
    // An unreadable body is treated like a body without a url
    let url = match body {
        Ok(Json(body)) => body.url,
        Err(rejection) => {
            tracing::debug!(%kind, error = %rejection, "unusable request body");
            None
        }
    };

    let Some(request) = DownloadRequest::new(url, kind) else {
        return Error::Validation(URL_REQUIRED.to_string()).into_response();
    };

    let artifact = TempArtifact::allocate(state.temp_dir());
    let downloader = state.downloader(kind);

    tracing::info!(%kind, url = %request.url, path = ?artifact.path(), "download requested");

    // The tool runs in its own task: a client that disconnects does not stop
    // it, and the artifact is still dropped (and unlinked) when it finishes.
    let task = tokio::spawn(async move {
        let outcome = invoker::invoke(downloader.as_ref(), &request, artifact.path()).await;
        (artifact, outcome)
    });

    let (artifact, outcome) = match task.await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(%kind, error = %e, "download task failed");
            return failure_response(kind);
        }
    };

    match outcome {
        DownloadOutcome::Success { .. } => match ArtifactBody::open(artifact).await {
            Ok(body) => attachment_response(body),
            Err((artifact, e)) => {
                report_swallowed(SwallowedStage::Transmission, artifact.path(), &e);
                artifact.cleanup().await;
                failure_response(kind)
            }
        },
        DownloadOutcome::Failure { .. } => {
            artifact.cleanup().await;
            failure_response(kind)
        }
    }
}

fn failure_response(kind: MediaKind) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(kind.failure_message())),
    )
        .into_response()
}

fn attachment_response(body: ArtifactBody) -> Response {
    let length = body.len();
    let disposition = format!("attachment; filename=\"{}\"", body.file_name());

    let mut response = Body::from_stream(body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(naming::ARTIFACT_CONTENT_TYPE),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => tracing::warn!(error = %e, "invalid content-disposition"),
    }

    response
}
