//! Proof-of-work engine for tallychain
//!
//! The puzzle: find a `proof` such that the hex digest of the decimal
//! concatenation `"{last_proof}{proof}"` starts with a run of `'0'`
//! characters. Difficulty counts leading zero hex digits.

use crate::crypto::fingerprint;

/// Default number of leading zero hex digits a proof digest must carry.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Check whether `proof` solves the puzzle against `last_proof`.
///
/// The two proofs are concatenated in decimal form with no separator before
/// digesting. A difficulty of 0 accepts every proof.
pub fn valid_proof(last_proof: u64, proof: u64, difficulty: usize) -> bool {
    let digest = fingerprint(&format!("{}{}", last_proof, proof));
    digest.bytes().take(difficulty).all(|b| b == b'0')
}

/// Find the smallest proof satisfying [`valid_proof`] against `last_proof`.
///
/// Linear search starting at 0, incrementing by 1. This is unbounded CPU
/// work with no time limit by design: the search runs until a solution is
/// found, and for a fixed `last_proof` and `difficulty` it always returns
/// the same proof. Callers are expected to run it off the ledger lock (see
/// the mine handler), and may impose their own timeout at the task level.
pub fn find_proof(last_proof: u64, difficulty: usize) -> u64 {
    let mut proof = 0u64;
    while !valid_proof(last_proof, proof, difficulty) {
        proof += 1;
    }
    proof
}
