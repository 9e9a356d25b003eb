//! Content hashing for exact-match lookups.

/// Hex-encoded blake3 digest of the raw source text.
///
/// The text is hashed byte for byte: whitespace edits produce a different
/// hash and fall through to similarity matching.
pub fn pattern_hash(code: &str) -> String {
    blake3::hash(code.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_content_sensitive() {
        let a = pattern_hash("s.push(1)");
        assert_eq!(a, pattern_hash("s.push(1)"));
        assert_ne!(a, pattern_hash("s.push(2)"));
        assert_eq!(a.len(), 64);
    }
}
