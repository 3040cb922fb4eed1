//! Retrieval-augmented answering.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ragapi_core::config::Settings;
use ragapi_core::traits::{Embedder, Generator, VectorIndex};
use ragapi_core::types::{FieldMatch, GenerationOptions, SearchRequest, Source};
use ragapi_core::{sanitize, Error, Result};

use crate::prompt::build_prompt;

pub const FALLBACK_ANSWER: &str = "I don't know based on the indexed documents.";

/// Hits fetched per requested result when a substring path filter has to be
/// applied after the search.
pub const CONTAINS_OVERFETCH: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatQuery {
    pub question: String,
    pub top_k: usize,
    pub options: GenerationOptions,
    /// Only chunks whose stored path equals this value (filtered by the index).
    pub path_exact: Option<String>,
    /// Only chunks whose stored path contains this value (filtered after search).
    pub path_contains: Option<String>,
}

impl ChatQuery {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: 5,
            options: GenerationOptions::default(),
            path_exact: None,
            path_contains: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(sanitize).filter(|v| !v.is_empty())
}

pub struct RetrievalAugmenter {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    index: Arc<dyn VectorIndex>,
    collection: String,
}

impl RetrievalAugmenter {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
    ) -> Self {
        Self { embedder, generator, index, collection: collection.into() }
    }

    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self::new(embedder, generator, index, settings.vector.collection.clone())
    }

    pub async fn answer(&self, query: &ChatQuery) -> Result<ChatAnswer> {
        let question = sanitize(&query.question);
        if question.trim().is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }
        if query.top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".to_string()));
        }

        let vector = self.embedder.embed(&question).await?;

        let path_exact = non_empty(query.path_exact.as_deref());
        let path_contains = non_empty(query.path_contains.as_deref());
        let limit = if path_contains.is_some() { query.top_k.saturating_mul(CONTAINS_OVERFETCH) } else { query.top_k };
        let filter = path_exact.map(|value| FieldMatch { key: "path".to_string(), value });

        let hits = self.index.search(&self.collection, SearchRequest { vector, limit, filter }).await?;
        debug!(hits = hits.len(), limit, "search returned");

        let mut contexts = Vec::new();
        let mut sources = Vec::new();
        for hit in hits {
            let text = sanitize(&hit.payload.text);
            if text.is_empty() {
                continue;
            }
            let path = sanitize(&hit.payload.path);
            if path_contains.as_deref().is_some_and(|needle| !path.contains(needle)) {
                continue;
            }
            contexts.push(text);
            sources.push(Source { path, chunk_id: hit.payload.chunk_id, score: hit.score });
            if sources.len() == query.top_k {
                break;
            }
        }

        if contexts.is_empty() {
            info!("no usable context, returning fallback answer");
            return Ok(ChatAnswer { answer: FALLBACK_ANSWER.to_string(), sources: Vec::new() });
        }

        let prompt = build_prompt(&question, &contexts);
        let raw = self.generator.generate(&prompt, &query.options).await?;
        let answer = sanitize(&raw).trim().to_string();
        info!(snippets = contexts.len(), answer_chars = answer.chars().count(), "answered question");
        Ok(ChatAnswer { answer, sources })
    }
}
