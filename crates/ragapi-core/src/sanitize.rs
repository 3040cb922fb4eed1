//! Unicode hygiene for everything that crosses a process boundary.

use unicode_normalization::{is_nfc, UnicodeNormalization};

/// Normalize to NFC.
pub fn sanitize(text: &str) -> String {
    if is_nfc(text) {
        return text.to_owned();
    }
    text.nfc().collect()
}

/// Decode bytes as UTF-8, silently dropping every invalid sequence (no
/// replacement character), then normalize to NFC.
pub fn sanitize_bytes(bytes: &[u8]) -> String {
    let mut valid = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        valid.push_str(chunk.valid());
    }
    sanitize(&valid)
}
