//! Deterministic point identity.
//!
//! A point's id is derived from `(path, chunk_id, blake3(text))`, so ingesting
//! the same document twice overwrites the same points instead of duplicating
//! them. Editing a chunk's text yields a new id.

use uuid::{Builder, Uuid};

fn hash_content(s: &str) -> blake3::Hash {
    blake3::hash(s.as_bytes())
}

pub fn point_id(path: &str, chunk_id: usize, text: &str) -> Uuid {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(path.len() as u64).to_le_bytes());
    hasher.update(path.as_bytes());
    hasher.update(&(chunk_id as u64).to_le_bytes());
    hasher.update(hash_content(text).as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest.as_bytes()[..16]);
    Builder::from_random_bytes(bytes).into_uuid()
}
