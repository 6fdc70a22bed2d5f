//! Hashing primitives for tallychain

use sha2::{Digest, Sha256};

/// Length of a rendered digest in hex characters.
pub const FINGERPRINT_LEN: usize = 64;

/// SHA-256 digest of a string, rendered as lowercase hex.
///
/// This is the one digest function in the system: block fingerprints run it
/// over a block's canonical serialization, and the puzzle predicate runs it
/// over two concatenated proofs. Pure function, no side effects.
pub fn fingerprint(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_shape() {
        let digest = fingerprint("hello");
        assert_eq!(digest.len(), FINGERPRINT_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, digest.to_lowercase());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint("tally"), fingerprint("tally"));
    }

    #[test]
    fn test_fingerprint_sensitivity() {
        assert_ne!(fingerprint("tally"), fingerprint("tallz"));
        assert_ne!(fingerprint(""), fingerprint(" "));
    }
}
