//! Domain types shared by the ingestion and retrieval pipelines.

use serde::{Deserialize, Serialize};

/// A source file after text extraction. `path` is relative to the document
/// root; `text` is empty when extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub text: String,
}

/// One overlapping window of a document.
///
/// - `path`: owning document, relative to the document root
/// - `chunk_id`: zero-based position within the document
/// - `text`: sanitized, whitespace-collapsed window text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub path: String,
    pub chunk_id: usize,
    pub text: String,
}

/// Payload stored next to each vector. Fields are optional on the way back
/// out because the index may hold points written by other tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkPayload {
    pub path: String,
    pub chunk_id: Option<usize>,
    pub text: String,
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        Self { path: chunk.path.clone(), chunk_id: Some(chunk.chunk_id), text: chunk.text.clone() }
    }
}

/// A chunk after embedding, ready for upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
}

/// Equality match on one payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    pub limit: usize,
    pub filter: Option<FieldMatch>,
}

/// A search hit. Hits are returned in descending `score` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Options forwarded to the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Predicted-token budget.
    pub num_predict: u32,
    /// Compute-placement hint (layers offloaded to the GPU).
    pub num_gpu: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { num_predict: 256, num_gpu: 32 }
    }
}

/// A retrieved snippet reported alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub path: String,
    pub chunk_id: Option<usize>,
    pub score: f32,
}
