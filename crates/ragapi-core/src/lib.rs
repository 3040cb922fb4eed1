//! ragapi-core
//!
//! Settings, error taxonomy, domain types and provider traits shared by the
//! workspace, plus the text side of the pipeline: sanitizing, chunking and
//! document extraction.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod documents;
pub mod error;
pub mod sanitize;
pub mod traits;
pub mod types;

pub use chunker::Chunker;
pub use config::Settings;
pub use error::{Error, Result};
pub use sanitize::{sanitize, sanitize_bytes};
