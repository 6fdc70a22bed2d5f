use super::chain::Block;
use crate::miner;

/// Structural validity of a chain: every block must record the fingerprint
/// of its predecessor, and every block's proof must solve the puzzle
/// against its predecessor's proof at the given difficulty.
///
/// Only adjacent pairs are inspected, so the genesis block itself is never
/// checked (its sentinel proof and parent fingerprint are exempt by
/// construction). Empty and single-block chains are trivially valid. A
/// block that cannot be fingerprinted counts as invalid rather than an
/// error; callers treat peer chains as untrusted input and only need a
/// verdict.
pub fn is_valid_chain(chain: &[Block], difficulty: usize) -> bool {
    for pair in chain.windows(2) {
        let (parent, child) = (&pair[0], &pair[1]);

        let parent_fp = match parent.fingerprint() {
            Ok(fp) => fp,
            Err(err) => {
                tracing::debug!(index = parent.index, %err, "unfingerprintable block");
                return false;
            }
        };
        if child.previous_fingerprint != parent_fp {
            tracing::debug!(index = child.index, "broken fingerprint linkage");
            return false;
        }

        if !miner::valid_proof(parent.proof, child.proof, difficulty) {
            tracing::debug!(index = child.index, proof = child.proof, "invalid proof");
            return false;
        }
    }
    true
}

/// Header sanity beyond structural validity: indices count up from 1 one at
/// a time and timestamps never run backwards. Not part of chain acceptance;
/// reconciliation logs a warning when an adopted chain fails this check.
pub fn has_ordered_headers(chain: &[Block]) -> bool {
    for (position, block) in chain.iter().enumerate() {
        if block.index != position as u64 + 1 {
            return false;
        }
    }
    chain
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp)
}
