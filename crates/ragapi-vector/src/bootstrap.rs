//! Ensures the target collection exists with the embedder's dimensionality.

use std::sync::Arc;

use tracing::{info, warn};

use ragapi_core::config::Settings;
use ragapi_core::traits::{Embedder, VectorIndex};
use ragapi_core::types::Distance;
use ragapi_core::{Error, Result};
use ragapi_embed::probe_dimension;

pub struct IndexBootstrapper {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    recreate_on_mismatch: bool,
}

impl IndexBootstrapper {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, collection: impl Into<String>) -> Self {
        Self { index, embedder, collection: collection.into(), recreate_on_mismatch: false }
    }

    pub fn from_settings(settings: &Settings, index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(index, embedder, settings.vector.collection.clone())
            .recreate_on_mismatch(settings.vector.recreate_on_mismatch)
    }

    /// Drop and recreate a collection whose dimension disagrees with the probe,
    /// instead of failing. Destroys every point already stored in it.
    pub fn recreate_on_mismatch(mut self, yes: bool) -> Self {
        self.recreate_on_mismatch = yes;
        self
    }

    /// Probe the embedder, create the collection if absent and verify its
    /// dimension otherwise. Returns the probed dimension.
    pub async fn ensure_ready(&self) -> Result<usize> {
        let dim = probe_dimension(self.embedder.as_ref()).await?;
        let existing = self.index.list_collections().await?;

        if !existing.iter().any(|name| name == &self.collection) {
            info!(collection = %self.collection, dim, model = self.embedder.model_id(), "collection missing, creating");
            self.index.create_collection(&self.collection, dim, Distance::Cosine).await?;
            return Ok(dim);
        }

        match self.index.collection_dimension(&self.collection).await? {
            Some(found) if found == dim => Ok(dim),
            Some(found) if self.recreate_on_mismatch => {
                warn!(collection = %self.collection, existing = found, probe = dim, "dimension mismatch, recreating collection");
                self.index.delete_collection(&self.collection).await?;
                self.index.create_collection(&self.collection, dim, Distance::Cosine).await?;
                Ok(dim)
            }
            Some(found) => Err(Error::DimensionMismatch { collection: self.collection.clone(), existing: found, probe: dim }),
            // Listed a moment ago but gone now; treat like a fresh start.
            None => {
                self.index.create_collection(&self.collection, dim, Distance::Cosine).await?;
                Ok(dim)
            }
        }
    }
}
