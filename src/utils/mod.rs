//! Common utilities and helper functions
//!
//! This module provides shared text helpers used across the pipeline.

pub mod error;

/// Strip replacement characters left by lossy decoding and trim whitespace
pub fn normalize_text(text: &str) -> String {
    text.replace('\u{FFFD}', "").trim().to_string()
}

/// Decode bytes as ISO-8859-1: every byte becomes the code point of the same value
pub fn decode_bytewise(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Acme\u{FFFD} Ltd "), "Acme Ltd");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_decode_bytewise() {
        assert_eq!(decode_bytewise(b"abc"), "abc");
        assert_eq!(decode_bytewise(&[0xE9]), "\u{e9}");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }
}
