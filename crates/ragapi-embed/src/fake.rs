//! Deterministic embedder for offline development and tests.
//!
//! Each whitespace token is hashed into one bucket of the output vector, which
//! is then L2-normalized. Identical texts map to identical vectors and texts
//! sharing tokens land close together under cosine similarity.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use twox_hash::XxHash64;

use ragapi_core::traits::Embedder;
use ragapi_core::{sanitize, Result};

pub const FAKE_DIM: usize = 384;

pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("fake:d{dim}") }
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in sanitize(text).to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self { Self::new(FAKE_DIM) }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str { &self.id }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_and_determinism() {
        let embedder = FakeEmbedder::new(64);
        let v1 = embedder.embed_sync("hello world");
        let v2 = embedder.embed_sync("hello   world");
        assert_eq!(v1.len(), 64);
        let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
        for (a, b) in v1.iter().zip(v2.iter()) {
            assert!((a - b).abs() <= 1e-6);
        }
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = FakeEmbedder::new(8).embed_sync("");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
