use super::*;
use crate::Config;
use crate::invoker::MediaDownloader;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


/// What a [`FakeDownloader`] does when asked to download
#[derive(Clone)]
enum Behavior {
    /// Write these bytes to the destination and succeed
    Write(&'static [u8]),
    /// Fail without touching the destination
    Fail,
    /// Write a partial file, then fail
    PartialThenFail,
    /// Report success without writing anything
    SucceedWithoutFile,
    /// Sleep, then write these bytes and succeed
    Slow(Duration, &'static [u8]),
}

/// In-process stand-in for yt-dlp / spotdl
struct FakeDownloader {
    name: &'static str,
    behavior: Behavior,
    started: AtomicUsize,
    finished: AtomicUsize,
    destinations: Mutex<Vec<PathBuf>>,
}

impl FakeDownloader {
    fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            destinations: Mutex::new(Vec::new()),
        })
    }

    fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDownloader for FakeDownloader {
    async fn download(&self, _url: &str, destination: &Path) -> crate::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.destinations
            .lock()
            .unwrap()
            .push(destination.to_path_buf());

        let result: crate::Result<()> = match &self.behavior {
            Behavior::Write(bytes) => tokio::fs::write(destination, bytes)
                .await
                .map_err(Into::into),
            Behavior::Fail => Err(crate::Error::ToolExit {
                tool: "fake",
                code: Some(1),
                stderr: "fake failure".to_string(),
            }),
            Behavior::PartialThenFail => {
                tokio::fs::write(destination, b"partial").await?;
                Err(crate::Error::ToolExit {
                    tool: "fake",
                    code: Some(1),
                    stderr: "died halfway".to_string(),
                })
            }
            Behavior::SucceedWithoutFile => Ok(()),
            Behavior::Slow(delay, bytes) => {
                tokio::time::sleep(*delay).await;
                tokio::fs::write(destination, bytes)
                    .await
                    .map_err(Into::into)
            }
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Test harness: temp dir, fake tools and the router built on them
struct TestApp {
    temp_dir: TempDir,
    youtube: Arc<FakeDownloader>,
    spotify: Arc<FakeDownloader>,
    state: AppState,
}

impl TestApp {
    fn new(youtube: Behavior, spotify: Behavior) -> Self {
        Self::with_config(youtube, spotify, |_| {})
    }

    fn with_config(
        youtube: Behavior,
        spotify: Behavior,
        customize: impl FnOnce(&mut Config),
    ) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.download.temp_dir = temp_dir.path().to_path_buf();
        customize(&mut config);

        let youtube = FakeDownloader::new("fake-yt-dlp", youtube);
        let spotify = FakeDownloader::new("fake-spotdl", spotify);
        let state = AppState::new(Arc::new(config), youtube.clone(), spotify.clone());

        Self {
            temp_dir,
            youtube,
            spotify,
            state,
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    fn leftover_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_api_server_starts_and_shuts_down() {
    let app = TestApp::with_config(Behavior::Fail, Behavior::Fail, |config| {
        // Port 0 = OS assigns a free port
        config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    });

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server(app.state.clone(), async move {
        rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_api_server_reports_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = occupied.local_addr().unwrap();

    let app = TestApp::with_config(Behavior::Fail, Behavior::Fail, |config| {
        config.api.bind_address = address;
    });

    let result = start_api_server(app.state.clone(), std::future::pending()).await;
    assert!(matches!(result, Err(crate::Error::Io(_))));
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let app = TestApp::new(Behavior::Fail, Behavior::Fail);

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origin() {
    let app = TestApp::with_config(Behavior::Fail, Behavior::Fail, |config| {
        config.api.cors_origins = vec!["http://allowed.test".to_string()];
    });

    let allowed = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("Origin", "http://allowed.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "http://allowed.test"
    );

    let denied = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("Origin", "http://evil.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(
        denied
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}

#[tokio::test]
async fn test_cors_preflight_for_download_endpoint() {
    let app = TestApp::new(Behavior::Fail, Behavior::Fail);

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/download/youtube")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-methods")
    );
    assert_eq!(app.youtube.started(), 0);
}
