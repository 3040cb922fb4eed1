//! ragapi-vector
//!
//! Vector index adapters (Qdrant over REST, plus an in-memory index for tests
//! and offline runs), deterministic point ids and the collection bootstrapper.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod bootstrap;
pub mod memory;
pub mod point_id;
pub mod qdrant;

pub use bootstrap::IndexBootstrapper;
pub use memory::MemoryIndex;
pub use point_id::point_id;
pub use qdrant::QdrantIndex;
