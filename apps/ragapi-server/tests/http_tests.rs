use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ragapi_core::config::Settings;
use ragapi_core::traits::{Generator, VectorIndex};
use ragapi_core::types::{Distance, GenerationOptions};
use ragapi_core::{Error, Result};
use ragapi_embed::FakeEmbedder;
use ragapi_server::{router, AppState};
use ragapi_vector::MemoryIndex;

/// Echoes the generation options so tests can see what was forwarded.
struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, _prompt: &str, options: &GenerationOptions) -> Result<String> {
        Ok(format!(" predict={} gpu={} ", options.num_predict, options.num_gpu))
    }
}

struct DownGenerator;

#[async_trait]
impl Generator for DownGenerator {
    async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
        Err(Error::Provider("connection refused".to_string()))
    }
}

fn app(docs: &TempDir, index: Arc<MemoryIndex>, generator: Arc<dyn Generator>) -> Router {
    let mut settings = Settings::default();
    settings.ingest.chunk_size = 40;
    settings.ingest.chunk_overlap = 10;
    let state = AppState::new(settings, Arc::new(FakeEmbedder::new(32)), generator, index)
        .with_docs_root(docs.path().to_path_buf());
    router(state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn health_is_ok() {
    let docs = TempDir::new().unwrap();
    let app = app(&docs, Arc::new(MemoryIndex::new()), Arc::new(EchoGenerator));
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn ingest_then_chat_round_trip() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("well.md"), "The well is north of the barn, past the apple trees and the old fence.").unwrap();
    fs::write(docs.path().join("skip.csv"), "a,b,c").unwrap();
    let index = Arc::new(MemoryIndex::new());
    let app = app(&docs, index.clone(), Arc::new(EchoGenerator));

    let (status, report) = call(&app, "POST", "/ingest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["files_indexed"], json!(1));
    let chunks = report["chunks_indexed"].as_u64().unwrap();
    assert!(chunks >= 2, "text longer than one window: {report}");
    assert_eq!(index.point_count("docs").await as u64, chunks);

    let (status, body) = call(&app, "POST", "/chat", Some(json!({ "question": "Where is the well?", "top_k": 2, "num_gpu": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], json!("predict=256 gpu=0"));
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|s| s["path"] == json!("well.md")));
    assert!(sources[0]["score"].as_f64().unwrap() >= sources[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn chat_on_empty_collection_returns_fallback() {
    let docs = TempDir::new().unwrap();
    let index = Arc::new(MemoryIndex::new());
    index.create_collection("docs", 32, Distance::Cosine).await.unwrap();
    let app = app(&docs, index, Arc::new(DownGenerator));

    let (status, body) = call(&app, "POST", "/chat", Some(json!({ "question": "anything?" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "I don't know based on the indexed documents.", "sources": [] }));
}

#[tokio::test]
async fn blank_question_is_a_bad_request() {
    let docs = TempDir::new().unwrap();
    let app = app(&docs, Arc::new(MemoryIndex::new()), Arc::new(EchoGenerator));
    let (status, body) = call(&app, "POST", "/chat", Some(json!({ "question": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn malformed_chat_bodies_use_the_error_shape() {
    let docs = TempDir::new().unwrap();
    let app = app(&docs, Arc::new(MemoryIndex::new()), Arc::new(EchoGenerator));

    let (status, body) = call(&app, "POST", "/chat", Some(json!({ "top_k": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("question"), "{body}");

    let (status, body) = call(&app, "POST", "/chat", Some(json!({ "question": "ok", "top_k": "many" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upstream_failures_are_bad_gateway() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("a.txt"), "Some indexed text about bees and honey.").unwrap();
    let index = Arc::new(MemoryIndex::new());
    let app = app(&docs, index, Arc::new(DownGenerator));

    // no collection yet
    let (status, _) = call(&app, "POST", "/chat", Some(json!({ "question": "bees?" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    call(&app, "POST", "/ingest", None).await;
    let (status, body) = call(&app, "POST", "/chat", Some(json!({ "question": "bees?" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn dimension_drift_is_a_server_error() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("a.txt"), "hello").unwrap();
    let index = Arc::new(MemoryIndex::new());
    index.create_collection("docs", 8, Distance::Cosine).await.unwrap();
    let app = app(&docs, index, Arc::new(EchoGenerator));

    let (status, body) = call(&app, "POST", "/ingest", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("dimension"));
}
