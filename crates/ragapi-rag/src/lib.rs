//! ragapi-rag
//!
//! The two pipelines: ingestion (documents → chunks → vectors → index) and
//! retrieval-augmented answering (question → hits → prompt → answer).

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod ingest;
pub mod prompt;
pub mod retrieve;

pub use ingest::{IngestReport, IngestionPipeline};
pub use prompt::{build_prompt, SYSTEM_INSTRUCTION};
pub use retrieve::{ChatAnswer, ChatQuery, RetrievalAugmenter, CONTAINS_OVERFETCH, FALLBACK_ANSWER};
