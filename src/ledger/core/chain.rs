use crate::crypto;
use crate::error::Result;

/// Sentinel proof carried by the genesis block. A caller-chosen constant,
/// not puzzle-derived; genesis is exempt from puzzle verification.
pub const GENESIS_PROOF: u64 = 100;

/// Sentinel parent fingerprint carried by the genesis block.
pub const GENESIS_FINGERPRINT: &str = "1";

/// A movement of value between two identifiers. Immutable once constructed;
/// owned by the pending pool until sealed into a block, which then owns a
/// copy. Amounts are not validated anywhere (zero and negative values are
/// accepted on purpose; no balances are tracked).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transfer {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

/// One sealed unit of the chain.
///
/// `index` is 1-based and strictly increasing by one per block.
/// `timestamp` is fractional seconds since the Unix epoch. Blocks are
/// created exclusively by the ledger's seal operation, never mutated after
/// creation, and destroyed only by wholesale chain replacement during
/// reconciliation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transfers: Vec<Transfer>,
    pub proof: u64,
    pub previous_fingerprint: String,
}

impl Block {
    /// Canonical fingerprint of this block.
    ///
    /// Digests the block's JSON form with object keys sorted at every level
    /// (serde_json's default `Map` iterates keys in sorted order), so the
    /// result is a pure function of field values, stable across process
    /// runs and across nodes. The same serde representation travels on the
    /// wire, which keeps fingerprints reproducible after a round trip.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_value(self)?;
        Ok(crypto::fingerprint(&canonical.to_string()))
    }
}
