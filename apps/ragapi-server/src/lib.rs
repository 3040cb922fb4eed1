//! HTTP surface: `/health`, `/ingest` and `/chat` over the two pipelines.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ragapi_core::config::Settings;
use ragapi_core::traits::{Embedder, Generator, VectorIndex};
use ragapi_core::types::GenerationOptions;
use ragapi_core::Error;
use ragapi_embed::{embedder_from_settings, generator_from_settings};
use ragapi_rag::{ChatAnswer, ChatQuery, IngestReport, IngestionPipeline, RetrievalAugmenter};
use ragapi_vector::QdrantIndex;

/// Install the fmt subscriber. `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding in another binary) is not an error.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    docs_root: PathBuf,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    augmenter: Arc<RetrievalAugmenter>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let augmenter = RetrievalAugmenter::from_settings(&settings, embedder.clone(), generator, index.clone());
        Self {
            docs_root: settings.docs_root(),
            settings: Arc::new(settings),
            embedder,
            index,
            augmenter: Arc::new(augmenter),
        }
    }

    /// Wire the Ollama and Qdrant clients described by `settings`.
    pub fn from_settings(settings: Settings) -> ragapi_core::Result<Self> {
        let embedder = embedder_from_settings(&settings)?;
        let generator = generator_from_settings(&settings)?;
        let index: Arc<dyn VectorIndex> = Arc::new(QdrantIndex::from_settings(&settings)?);
        Ok(Self::new(settings, embedder, generator, index))
    }

    pub fn with_docs_root(mut self, root: PathBuf) -> Self {
        self.docs_root = root;
        self
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn ingestion(&self) -> ragapi_core::Result<IngestionPipeline> {
        IngestionPipeline::new(&self.settings, self.embedder.clone(), self.index.clone())
    }
}

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self { Self(e) }
}

/// Malformed or incomplete request bodies are the caller's fault.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Provider(_) | Error::Index(_) => StatusCode::BAD_GATEWAY,
            Error::InvalidConfig(_) | Error::DimensionMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(%status, error = %self.0, "request failed");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
    #[serde(default = "default_num_gpu")]
    pub num_gpu: u32,
    #[serde(default)]
    pub path_exact: Option<String>,
    #[serde(default)]
    pub path_contains: Option<String>,
}

fn default_top_k() -> usize { 5 }

fn default_num_predict() -> u32 { GenerationOptions::default().num_predict }

fn default_num_gpu() -> u32 { GenerationOptions::default().num_gpu }

impl From<ChatRequest> for ChatQuery {
    fn from(req: ChatRequest) -> Self {
        Self {
            question: req.question,
            top_k: req.top_k,
            options: GenerationOptions { num_predict: req.num_predict, num_gpu: req.num_gpu },
            path_exact: req.path_exact,
            path_contains: req.path_contains,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok".to_string() })
}

async fn ingest(State(state): State<AppState>) -> Result<Json<IngestReport>, ApiError> {
    let report = state.ingestion()?.ingest(&state.docs_root).await?;
    Ok(Json(report))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let Json(req) = body?;
    let answer = state.augmenter.answer(&ChatQuery::from(req)).await?;
    Ok(Json(answer))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
