//! Document discovery and text extraction.
//!
//! Extraction never fails: unreadable or unparsable files come back as empty
//! text and are logged, so a single bad file cannot abort an ingestion run.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::sanitize::{sanitize, sanitize_bytes};
use crate::types::Document;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// All supported files under `root`, recursively, in a stable order.
/// Symlinks are followed; link cycles are reported by walkdir and skipped.
/// A missing root yields an empty list.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(root).follow_links(true).into_iter();
    for entry in walker.filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if is_supported(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

/// Path of `file` relative to `root`, `/`-separated and sanitized.
pub fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    sanitize(&parts.join("/"))
}

pub async fn extract_text(path: &Path) -> String {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read document");
            return String::new();
        }
    };
    match extension_of(path).as_deref() {
        Some("pdf") => extract_pdf(path, bytes).await,
        Some("txt" | "md") => sanitize_bytes(&bytes),
        _ => {
            debug!(path = %path.display(), "unsupported extension, skipping");
            String::new()
        }
    }
}

async fn extract_pdf(path: &Path, bytes: Vec<u8>) -> String {
    // The parser is CPU-bound and may panic on malformed input; a panic surfaces
    // here as a join error.
    let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;
    match parsed {
        Ok(Ok(text)) => sanitize(&text),
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "PDF parse error");
            String::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "PDF parser aborted");
            String::new()
        }
    }
}

pub async fn load_document(root: &Path, file: &Path) -> Document {
    Document { path: relative_path(root, file), text: extract_text(file).await }
}
