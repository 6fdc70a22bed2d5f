//! Peer reconciliation module for tallychain
//!
//! This module implements the longest-valid-chain rule across peers:
//! - Concurrent full-chain fetches from every registered peer over HTTP
//! - Per-peer request timeout so one dead peer cannot stall the sweep
//! - Structural validation of every candidate before it is considered
//! - Atomic wholesale replacement of the local chain on adoption

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::{LedgerError, Result};
use crate::ledger::{has_ordered_headers, is_valid_chain, Block, Ledger};

/// Wire shape of a peer's `GET /chain` response.
#[derive(Debug, serde::Deserialize)]
struct ChainEnvelope {
    chain: Vec<Block>,
}

/// Fetches and adopts peer chains on behalf of one node.
pub struct Synchronizer {
    ledger: Arc<RwLock<Ledger>>,
    client: reqwest::Client,
}

impl Synchronizer {
    /// Builds a synchronizer whose HTTP client applies `peer_timeout` to
    /// every request it makes.
    pub fn new(
        ledger: Arc<RwLock<Ledger>>,
        peer_timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(peer_timeout).build()?;
        Ok(Self { ledger, client })
    }

    /// Downloads the full chain advertised by `peer` (a `host:port` string).
    pub async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>> {
        fetch_chain_with(&self.client, peer).await
    }

    /// One reconciliation sweep over every registered peer.
    ///
    /// Peers are polled concurrently and their results consumed in sorted
    /// address order, so the outcome does not depend on response timing.
    /// A peer that is unreachable, times out, or serves a malformed or
    /// structurally invalid chain is skipped with a warning. The longest
    /// valid candidate strictly longer than the local chain replaces it
    /// wholesale; pending transfers and the peer set are untouched.
    /// Returns whether a replacement happened.
    pub async fn reconcile(&self) -> bool {
        let (peers, local_len, difficulty) = {
            let ledger = self.ledger.read().await;
            (
                ledger.peers.iter().cloned().collect::<Vec<String>>(),
                ledger.blocks.len(),
                ledger.difficulty,
            )
        };

        if peers.is_empty() {
            tracing::debug!("reconcile skipped, no registered peers");
            return false;
        }

        let mut fetches = Vec::with_capacity(peers.len());
        for peer in peers {
            let client = self.client.clone();
            fetches.push((
                peer.clone(),
                tokio::spawn(async move { fetch_chain_with(&client, &peer).await }),
            ));
        }

        let mut best: Option<Vec<Block>> = None;
        let mut best_len = local_len;
        for (peer, handle) in fetches {
            let fetched = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!(peer = %peer, %err, "chain fetch task failed");
                    continue;
                }
            };
            let chain = match fetched {
                Ok(chain) => chain,
                Err(err) => {
                    tracing::warn!(peer = %peer, %err, "peer skipped");
                    continue;
                }
            };
            if chain.len() > best_len && is_valid_chain(&chain, difficulty) {
                tracing::debug!(peer = %peer, len = chain.len(), "longer valid chain found");
                best_len = chain.len();
                best = Some(chain);
            }
        }

        match best {
            Some(chain) => {
                if !has_ordered_headers(&chain) {
                    tracing::warn!("adopted chain has irregular indices or timestamps");
                }
                let mut ledger = self.ledger.write().await;
                if chain.len() <= ledger.blocks.len() {
                    // The local chain grew past the candidate while peers
                    // were being polled; keep it.
                    return false;
                }
                tracing::info!(
                    old_len = ledger.blocks.len(),
                    new_len = chain.len(),
                    "adopting longer peer chain"
                );
                ledger.replace_chain(chain);
                true
            }
            None => false,
        }
    }
}

/// Free function so spawned fetch tasks can run off a cloned client without
/// borrowing the synchronizer.
async fn fetch_chain_with(client: &reqwest::Client, peer: &str) -> Result<Vec<Block>> {
    let url = format!("http://{}/chain", peer);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| LedgerError::PeerUnreachable(format!("{}: {}", peer, e)))?;

    if !response.status().is_success() {
        return Err(LedgerError::PeerUnreachable(format!(
            "{}: status {}",
            peer,
            response.status()
        )));
    }

    let envelope = response
        .json::<ChainEnvelope>()
        .await
        .map_err(|e| LedgerError::MalformedPeerPayload(format!("{}: {}", peer, e)))?;
    Ok(envelope.chain)
}
