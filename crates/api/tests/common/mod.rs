use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use move37_api::config::ServerConfig;
use move37_api::router::build_app_router;
use move37_api::state::AppState;
use move37_core::store::DataStore;
use move37_genai::{GenAiError, GeneratedImage, ImageGenerator, ImageRequest, TextGenerator};
use move37_pipeline::{ReferenceGenerator, ThrottlePolicy};

// ---------------------------------------------------------------------------
// Fake capabilities
// ---------------------------------------------------------------------------

/// Image generator returning `count` small JPEG-ish payloads, or an API
/// error when `fail_status` is set.
#[derive(Default)]
pub struct FakeImages {
    pub calls: AtomicU32,
    pub fail_status: Option<u16>,
}

impl FakeImages {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, GenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_status {
            return Err(GenAiError::Api {
                status,
                body: "model overloaded".into(),
            });
        }
        Ok((0..request.count)
            .map(|_| GeneratedImage {
                bytes: b"\xff\xd8fake".to_vec(),
                mime_type: "image/jpeg".into(),
            })
            .collect())
    }
}

/// Text generator answering every prompt with the same document.
pub struct FakeText {
    pub answer: Value,
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate_structured(
        &self,
        _system_instructions: &str,
        _user_prompt: &str,
    ) -> Result<Value, GenAiError> {
        Ok(self.answer.clone())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` rooted at `data_root`.
pub fn test_config(data_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        data_root: PathBuf::from(data_root),
    }
}

/// Build the full application router with default fakes.
pub fn build_test_app(data_root: &Path) -> Router {
    build_test_app_with(
        data_root,
        Arc::new(FakeImages::default()),
        Arc::new(FakeText {
            answer: serde_json::json!({"name": "Kaelen"}),
        }),
    )
}

/// Build the full application router around the given capabilities, with
/// throttling disabled.
pub fn build_test_app_with(
    data_root: &Path,
    images: Arc<dyn ImageGenerator>,
    text: Arc<dyn TextGenerator>,
) -> Router {
    let config = test_config(data_root);
    let store = DataStore::new(data_root);
    let state = AppState {
        references: Arc::new(ReferenceGenerator::new(
            store.clone(),
            images,
            ThrottlePolicy::disabled(),
        )),
        store,
        text,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Write `value` as JSON at `relative` under `root`, creating directories.
pub fn write_fixture(root: &Path, relative: &str, value: &Value) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn read_fixture(root: &Path, relative: &str) -> Value {
    serde_json::from_slice(&std::fs::read(root.join(relative)).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_text(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
