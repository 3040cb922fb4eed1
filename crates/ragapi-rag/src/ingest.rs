//! Ingestion: discover → extract → chunk → embed → upsert, one batch per file.
//!
//! A failed embedding or upsert aborts the whole run. Files already written
//! stay in the index; rerunning is safe because point ids are deterministic.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ragapi_core::config::Settings;
use ragapi_core::documents::{discover, load_document};
use ragapi_core::traits::{Embedder, VectorIndex};
use ragapi_core::types::{Chunk, ChunkPayload, IndexedPoint};
use ragapi_core::{Chunker, Result};
use ragapi_vector::{point_id, IndexBootstrapper};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Files enumerated, including those whose text came back empty.
    pub files_indexed: usize,
    pub chunks_indexed: usize,
}

pub struct IngestionPipeline {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    bootstrapper: IndexBootstrapper,
    collection: String,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(settings: &Settings, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Result<Self> {
        let chunker = Chunker::new(settings.ingest.chunk_size, settings.ingest.chunk_overlap)?;
        let bootstrapper = IndexBootstrapper::from_settings(settings, index.clone(), embedder.clone());
        Ok(Self {
            chunker,
            embedder,
            index,
            bootstrapper,
            collection: settings.vector.collection.clone(),
            concurrency: settings.ingest.embed_concurrency.max(1),
        })
    }

    pub async fn ingest(&self, root: &Path) -> Result<IngestReport> {
        let files = discover(root);
        if files.is_empty() {
            info!(root = %root.display(), "no supported documents found");
            return Ok(IngestReport::default());
        }
        info!(
            root = %root.display(),
            files = files.len(),
            collection = %self.collection,
            chunk_size = self.chunker.size(),
            chunk_overlap = self.chunker.overlap(),
            "starting ingestion"
        );

        let dim = self.bootstrapper.ensure_ready().await?;
        debug!(dim, "collection ready");

        let mut report = IngestReport { files_indexed: files.len(), chunks_indexed: 0 };
        for file in &files {
            let doc = load_document(root, file).await;
            if doc.text.is_empty() {
                warn!(path = %doc.path, "no text extracted, skipping");
                continue;
            }
            let chunks = self.chunker.chunk_document(&doc.path, &doc.text);
            if chunks.is_empty() {
                warn!(path = %doc.path, "document is blank, skipping");
                continue;
            }
            let points = self.embed_chunks(&chunks).await?;
            let count = points.len();
            self.index.upsert(&self.collection, points).await?;
            report.chunks_indexed += count;
            info!(path = %doc.path, chunks = count, "indexed document");
        }

        info!(files = report.files_indexed, chunks = report.chunks_indexed, "ingestion finished");
        Ok(report)
    }

    /// Embed every chunk of one file with at most `concurrency` requests in
    /// flight. Output order matches input order.
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexedPoint>> {
        let pending: Vec<_> = chunks.iter().map(|c| self.embedder.embed(&c.text)).collect();
        let vectors: Vec<Vec<f32>> = stream::iter(pending)
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        Ok(chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedPoint {
                id: point_id(&chunk.path, chunk.chunk_id, &chunk.text).to_string(),
                vector,
                payload: ChunkPayload::from(chunk),
            })
            .collect())
    }
}
