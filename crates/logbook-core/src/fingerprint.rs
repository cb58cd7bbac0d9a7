//! Content fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-256 of the exact source bytes.
//! Any byte change (whitespace included) produces a different fingerprint,
//! which is what the cache relies on to detect stale entries.

use sha2::{Digest, Sha256};

pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_whitespace_changes_fingerprint() {
        assert_ne!(fingerprint("Weight:: 200"), fingerprint("Weight:: 200 "));
        assert_eq!(fingerprint("Weight:: 200"), fingerprint("Weight:: 200"));
    }
}
