//! ragapi-embed
//!
//! Embedding gateway and generation client. The HTTP implementations talk to an
//! Ollama server; `FakeEmbedder` stands in when `embedding.use_fake` is set.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use std::sync::Arc;

use tracing::info;

use ragapi_core::config::Settings;
use ragapi_core::traits::{Embedder, Generator};
use ragapi_core::{Error, Result};

pub mod fake;
pub mod ollama;

pub use fake::FakeEmbedder;
pub use ollama::{OllamaEmbedder, OllamaGenerator};

/// Fixed text embedded to discover the provider's output dimensionality.
pub const PROBE_TEXT: &str = "dimension probe";

/// Embed [`PROBE_TEXT`] once; the returned length is authoritative.
pub async fn probe_dimension(embedder: &dyn Embedder) -> Result<usize> {
    let dim = embedder.embed(PROBE_TEXT).await?.len();
    if dim == 0 {
        return Err(Error::Provider(format!("{} reported a zero-length embedding", embedder.model_id())));
    }
    Ok(dim)
}

pub fn embedder_from_settings(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if settings.embedding.use_fake {
        let fake = FakeEmbedder::default();
        info!(dim = fake.dim(), "using FakeEmbedder");
        return Ok(Arc::new(fake));
    }
    Ok(Arc::new(OllamaEmbedder::from_settings(settings)?))
}

pub fn generator_from_settings(settings: &Settings) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(OllamaGenerator::from_settings(settings)?))
}
