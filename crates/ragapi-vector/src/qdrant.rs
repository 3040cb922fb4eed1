//! Qdrant REST client.
//!
//! Only the handful of endpoints the pipelines need: collection listing,
//! inspection, creation and deletion, batch point upsert and filtered search.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use ragapi_core::config::Settings;
use ragapi_core::traits::VectorIndex;
use ragapi_core::types::{ChunkPayload, Distance, FieldMatch, IndexedPoint, ScoredPoint, SearchRequest};
use ragapi_core::{Error, Result};

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorsConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VectorsConfig {
    Single(VectorSize),
    Named(HashMap<String, VectorSize>),
}

#[derive(Deserialize)]
struct VectorSize {
    size: usize,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: Distance,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: &'a [IndexedPoint],
}

#[derive(Serialize)]
struct SearchBody<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Deserialize)]
struct Hit {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<ChunkPayload>,
}

fn match_filter(m: &FieldMatch) -> Value {
    json!({ "must": [ { "key": m.key, "match": { "value": m.value } } ] })
}

fn point_id_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

pub struct QdrantIndex {
    client: Client,
    base_url: String,
}

impl QdrantIndex {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build Qdrant HTTP client: {e}")))?;
        Ok(Self { client, base_url: url.trim_end_matches('/').to_string() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.vector.url, settings.embedding_timeout())
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/collections/{}", self.base_url, name)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        request.send().await.map_err(|e| Error::Index(format!("{what}: {e}")))
    }

    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Index(format!("{what} returned {status}: {body}")))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response, what: &str) -> Result<T> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Index(format!("malformed {what} response: {e}")))?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let what = "list collections";
        let response = self.send(self.client.get(format!("{}/collections", self.base_url)), what).await?;
        let response = Self::ensure_success(response, what).await?;
        let result: CollectionsResult = Self::parse(response, what).await?;
        Ok(result.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>> {
        let what = "get collection";
        let response = self.send(self.client.get(self.collection_url(name)), what).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(response, what).await?;
        let info: CollectionInfo = Self::parse(response, what).await?;
        match info.config.params.vectors {
            VectorsConfig::Single(v) => Ok(Some(v.size)),
            VectorsConfig::Named(named) if named.len() == 1 => Ok(named.into_values().next().map(|v| v.size)),
            VectorsConfig::Named(named) => Err(Error::Index(format!(
                "collection '{name}' has {} named vectors; expected a single unnamed vector",
                named.len()
            ))),
        }
    }

    async fn create_collection(&self, name: &str, dim: usize, distance: Distance) -> Result<()> {
        let what = "create collection";
        let body = CreateCollection { vectors: VectorParams { size: dim, distance } };
        let response = self.send(self.client.put(self.collection_url(name)).json(&body), what).await?;
        Self::ensure_success(response, what).await?;
        info!(collection = name, dim, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let what = "delete collection";
        let response = self.send(self.client.delete(self.collection_url(name)), what).await?;
        Self::ensure_success(response, what).await?;
        info!(collection = name, "deleted collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let what = "upsert points";
        let url = format!("{}/points?wait=true", self.collection_url(collection));
        let response = self.send(self.client.put(url).json(&UpsertPoints { points: &points }), what).await?;
        Self::ensure_success(response, what).await?;
        debug!(collection, count = points.len(), "upserted points");
        Ok(())
    }

    async fn search(&self, collection: &str, request: SearchRequest) -> Result<Vec<ScoredPoint>> {
        let what = "search points";
        let body = SearchBody {
            vector: &request.vector,
            limit: request.limit,
            with_payload: true,
            filter: request.filter.as_ref().map(match_filter),
        };
        let url = format!("{}/points/search", self.collection_url(collection));
        let response = self.send(self.client.post(url).json(&body), what).await?;
        let response = Self::ensure_success(response, what).await?;
        let hits: Vec<Hit> = Self::parse(response, what).await?;
        Ok(hits
            .into_iter()
            .map(|h| ScoredPoint { id: point_id_string(h.id), score: h.score, payload: h.payload.unwrap_or_default() })
            .collect())
    }
}
