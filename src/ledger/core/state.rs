use std::collections::BTreeSet;

use super::chain::{Block, Transfer, GENESIS_FINGERPRINT, GENESIS_PROOF};
use crate::error::{LedgerError, Result};

/// Fractional seconds since the Unix epoch, millisecond precision.
fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// The full node state: sealed chain, pending transfer pool and known peers.
///
/// All mutation goes through the methods below; callers share a `Ledger`
/// behind a single `tokio::sync::RwLock` and hold the write guard for the
/// whole of any compound operation, so every method here can assume it has
/// exclusive access for its duration. Proof search is the one deliberately
/// slow step and runs on a snapshot, off the lock.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Ledger {
    pub blocks: Vec<Block>,
    pub pending: Vec<Transfer>,
    pub peers: BTreeSet<String>,
    pub difficulty: usize,
}

impl Ledger {
    /// Creates a ledger and seals its genesis block. The genesis carries
    /// sentinel values (`proof = 100`, parent fingerprint `"1"`) and an
    /// empty transfer list, so every node starts from an identical root.
    pub fn new(difficulty: usize) -> Result<Self> {
        let mut ledger = Ledger {
            blocks: Vec::new(),
            pending: Vec::new(),
            peers: BTreeSet::new(),
            difficulty,
        };
        ledger.seal_block(GENESIS_PROOF, Some(GENESIS_FINGERPRINT.to_string()))?;
        Ok(ledger)
    }

    /// Queues a transfer for inclusion in the next sealed block and returns
    /// it. Amounts are accepted as-is; there is no balance model to check
    /// against.
    pub fn submit_transfer(&mut self, sender: &str, recipient: &str, amount: f64) -> Transfer {
        let transfer = Transfer {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
        };
        self.pending.push(transfer.clone());
        transfer
    }

    /// Index the next sealed block will carry.
    pub fn next_index(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    /// Seals every pending transfer into a new block and appends it.
    ///
    /// `previous_fingerprint` is normally `None`, in which case the parent
    /// fingerprint is computed from the current last block. Callers that
    /// snapshotted the tip earlier (the mining flow) pass the fingerprint
    /// they computed instead. The proof is recorded as given; verifying it
    /// against the puzzle is the chain validator's job, not the seal's.
    pub fn seal_block(&mut self, proof: u64, previous_fingerprint: Option<String>) -> Result<Block> {
        let previous_fingerprint = match previous_fingerprint {
            Some(fp) => fp,
            None => self.last_block()?.fingerprint()?,
        };
        let block = Block {
            index: self.next_index(),
            timestamp: epoch_seconds(),
            transfers: self.pending.drain(..).collect(),
            proof,
            previous_fingerprint,
        };
        tracing::info!(
            index = block.index,
            proof = block.proof,
            transfers = block.transfers.len(),
            "block sealed"
        );
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// The most recently sealed block.
    ///
    /// Fails with [`LedgerError::EmptyChain`] only on a ledger whose chain
    /// was never populated; construction always seals a genesis, so in
    /// practice this is reachable solely from hand-built test fixtures.
    pub fn last_block(&self) -> Result<&Block> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    /// Records a peer address. Returns `true` if the peer was new, `false`
    /// if it was already known. Addresses are kept verbatim apart from
    /// trimming surrounding whitespace; the set iterates in sorted order,
    /// which fixes the order reconciliation polls peers in.
    pub fn register_peer(&mut self, address: &str) -> bool {
        let address = address.trim().to_string();
        let added = self.peers.insert(address.clone());
        if added {
            tracing::debug!(peer = %address, "peer registered");
        }
        added
    }

    /// Swaps the sealed chain for `chain` wholesale. Pending transfers and
    /// peers are untouched. Callers validate and compare lengths first;
    /// this method only performs the replacement.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        tracing::debug!(
            old_len = self.blocks.len(),
            new_len = chain.len(),
            "chain replaced"
        );
        self.blocks = chain;
    }
}
