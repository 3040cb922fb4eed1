use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Distance, GenerationOptions, IndexedPoint, ScoredPoint, SearchRequest};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `ollama:nomic-embed-text`).
    fn model_id(&self) -> &str;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

/// The narrow slice of a vector database used by the pipelines.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<String>>;
    /// `None` when the collection does not exist.
    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>>;
    async fn create_collection(&self, name: &str, dim: usize, distance: Distance) -> Result<()>;
    async fn delete_collection(&self, name: &str) -> Result<()>;
    /// Writes all points in one request; points with an existing id are replaced.
    async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()>;
    async fn search(&self, collection: &str, request: SearchRequest) -> Result<Vec<ScoredPoint>>;
}
