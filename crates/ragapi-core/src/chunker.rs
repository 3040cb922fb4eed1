//! Fixed-size overlapping character windows.
//!
//! Whitespace runs are collapsed to single spaces before windowing, so
//! boundaries do not depend on line breaks or indentation. Windows are
//! measured in characters, not bytes, and are not word-boundary aware.

use crate::error::{Error, Result};
use crate::sanitize::sanitize;
use crate::types::Chunk;

/// Unicode whitespace plus the ASCII information separators (U+001C..=U+001F),
/// which some extractors emit between records.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn collapse_whitespace(text: &str) -> String {
    text.split(is_separator).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Requires `size > overlap`; anything else would stall the window.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size <= overlap {
            return Err(Error::InvalidConfig(format!(
                "chunk size ({size}) must be greater than chunk overlap ({overlap})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize { self.size }

    pub fn overlap(&self) -> usize { self.overlap }

    /// Upper bound on the number of windows for a collapsed text of `len` chars.
    pub fn max_chunks(&self, len: usize) -> usize {
        len.div_ceil(self.size - self.overlap)
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let collapsed = sanitize(&collapse_whitespace(text));
        if collapsed.is_empty() {
            return Vec::new();
        }
        // Byte offset of every char boundary, including the end of the string.
        let bounds: Vec<usize> = collapsed
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(collapsed.len()))
            .collect();
        let len = bounds.len() - 1;

        let mut chunks = Vec::with_capacity(self.max_chunks(len));
        let mut start = 0usize;
        loop {
            let end = (start + self.size).min(len);
            chunks.push(collapsed[bounds[start]..bounds[end]].to_string());
            if end == len {
                break;
            }
            start = end.saturating_sub(self.overlap);
        }
        chunks
    }

    /// Chunk a document's text, numbering windows from zero.
    pub fn chunk_document(&self, path: &str, text: &str) -> Vec<Chunk> {
        self.chunk(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| Chunk { path: path.to_string(), chunk_id, text })
            .collect()
    }
}
