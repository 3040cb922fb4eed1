//! In-process vector index with exact cosine search.
//!
//! Behaves like the remote index where the pipelines can observe it: upserts
//! replace by id, vectors of the wrong dimensionality are rejected, and
//! searching a missing collection is an error.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use ragapi_core::traits::VectorIndex;
use ragapi_core::types::{Distance, IndexedPoint, ScoredPoint, SearchRequest};
use ragapi_core::{Error, Result};

struct Collection {
    dim: usize,
    points: BTreeMap<String, IndexedPoint>,
}

#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

fn missing(name: &str) -> Error {
    Error::Index(format!("collection '{name}' not found"))
}

impl MemoryIndex {
    pub fn new() -> Self { Self::default() }

    pub async fn point_count(&self, name: &str) -> usize {
        self.collections.read().await.get(name).map_or(0, |c| c.points.len())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.collections.read().await.get(name).map(|c| c.dim))
    }

    async fn create_collection(&self, name: &str, dim: usize, _distance: Distance) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(Error::Index(format!("collection '{name}' already exists")));
        }
        collections.insert(name.to_string(), Collection { dim, points: BTreeMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != target.dim) {
            return Err(Error::Index(format!(
                "wrong vector dimension for point {}: expected {}, got {}",
                bad.id,
                target.dim,
                bad.vector.len()
            )));
        }
        for point in points {
            target.points.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn search(&self, collection: &str, request: SearchRequest) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing(collection))?;
        if request.vector.len() != target.dim {
            return Err(Error::Index(format!(
                "wrong query dimension: expected {}, got {}",
                target.dim,
                request.vector.len()
            )));
        }
        let mut hits: Vec<ScoredPoint> = target
            .points
            .values()
            .filter(|p| match &request.filter {
                Some(m) if m.key == "path" => p.payload.path == m.value,
                Some(m) => {
                    tracing::warn!(key = %m.key, "memory index only filters on 'path'");
                    false
                }
                None => true,
            })
            .map(|p| ScoredPoint { id: p.id.clone(), score: cosine(&request.vector, &p.vector), payload: p.payload.clone() })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(request.limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragapi_core::types::{ChunkPayload, FieldMatch};

    fn point(id: &str, path: &str, vector: Vec<f32>) -> IndexedPoint {
        IndexedPoint {
            id: id.to_string(),
            vector,
            payload: ChunkPayload { path: path.to_string(), chunk_id: Some(0), text: id.to_string() },
        }
    }

    #[tokio::test]
    async fn search_orders_by_descending_cosine() {
        let index = MemoryIndex::new();
        index.create_collection("docs", 2, Distance::Cosine).await.unwrap();
        index
            .upsert("docs", vec![point("far", "a", vec![0.0, 1.0]), point("near", "b", vec![1.0, 0.1]), point("mid", "c", vec![1.0, 1.0])])
            .await
            .unwrap();

        let hits = index.search("docs", SearchRequest { vector: vec![1.0, 0.0], limit: 2, filter: None }).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }

    #[tokio::test]
    async fn path_filter_and_upsert_by_id() {
        let index = MemoryIndex::new();
        index.create_collection("docs", 2, Distance::Cosine).await.unwrap();
        index.upsert("docs", vec![point("p1", "a.txt", vec![1.0, 0.0]), point("p2", "b.txt", vec![1.0, 0.0])]).await.unwrap();
        index.upsert("docs", vec![point("p1", "a.txt", vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(index.point_count("docs").await, 2);

        let filter = Some(FieldMatch { key: "path".into(), value: "a.txt".into() });
        let hits = index.search("docs", SearchRequest { vector: vec![1.0, 0.0], limit: 5, filter }).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p1");
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let index = MemoryIndex::new();
        index.create_collection("docs", 3, Distance::Cosine).await.unwrap();
        let err = index.upsert("docs", vec![point("p", "a", vec![1.0])]).await.expect_err("dim mismatch");
        assert!(matches!(err, Error::Index(_)));
    }
}
