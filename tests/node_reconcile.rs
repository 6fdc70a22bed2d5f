//! Integration tests for peer reconciliation
//!
//! Each test stands up one or more peer nodes on ephemeral local ports and
//! exercises the synchronizer (or the `/consensus` endpoint) against them
//! over real HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use axum_test::TestServer;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use tallychain::api::{build_api_router, Node};
use tallychain::error::LedgerError;
use tallychain::ledger::{Block, Ledger};
use tallychain::miner;
use tallychain::sync::Synchronizer;

/// Seals `blocks` puzzle-solved blocks on top of genesis, each carrying one
/// transfer from `tag`.
fn mined_ledger(blocks: usize, difficulty: usize, tag: &str) -> Ledger {
    let mut ledger = Ledger::new(difficulty).expect("Failed to create ledger");
    for n in 0..blocks {
        let last_proof = ledger.last_block().unwrap().proof;
        let proof = miner::find_proof(last_proof, difficulty);
        ledger.submit_transfer(tag, "bob", n as f64 + 1.0);
        ledger.seal_block(proof, None).unwrap();
    }
    ledger
}

/// Serves `router` on an ephemeral local port and returns its address.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    addr.to_string()
}

fn peer_node(ledger: Ledger) -> Router {
    let api_node = Node::new(ledger, Duration::from_secs(2), 1.0).expect("Failed to create node");
    build_api_router(Arc::new(api_node))
}

#[tokio::test]
async fn test_reconcile_adopts_longer_peer_chain() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let peer_ledger = mined_ledger(3, 1, "alice");
        let expected = peer_ledger.blocks.clone();
        let peer_addr = serve(peer_node(peer_ledger)).await;

        // The local node has sealed a block of its own, so the histories diverge
        let ledger = Arc::new(RwLock::new(mined_ledger(1, 1, "carol")));
        ledger.write().await.register_peer(&peer_addr);
        let sync = Synchronizer::new(ledger.clone(), Duration::from_secs(2)).unwrap();

        assert!(sync.reconcile().await);
        assert_eq!(ledger.read().await.blocks, expected);

        // A second sweep is a no-op now that the chains are equally long
        assert!(!sync.reconcile().await);
        assert_eq!(ledger.read().await.blocks.len(), 4);
    })
    .await
    .expect("test_reconcile_adopts_longer_peer_chain timed out");
}

#[tokio::test]
async fn test_reconcile_rejects_tampered_peer_chain() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let mut peer_ledger = mined_ledger(3, 1, "alice");
        // Rewrite history on the peer; its chain no longer validates
        peer_ledger.blocks[2].transfers[0].amount = 9999.0;
        let peer_addr = serve(peer_node(peer_ledger)).await;

        let ledger = Arc::new(RwLock::new(Ledger::new(1).unwrap()));
        ledger.write().await.register_peer(&peer_addr);
        let sync = Synchronizer::new(ledger.clone(), Duration::from_secs(2)).unwrap();

        assert!(!sync.reconcile().await);
        assert_eq!(ledger.read().await.blocks.len(), 1);
    })
    .await
    .expect("test_reconcile_rejects_tampered_peer_chain timed out");
}

#[tokio::test]
async fn test_reconcile_prefers_longest_valid_chain() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let short = mined_ledger(1, 1, "alice");
        let long = mined_ledger(3, 1, "alice");
        let expected = long.blocks.clone();

        let short_addr = serve(peer_node(short)).await;
        let long_addr = serve(peer_node(long)).await;

        let ledger = Arc::new(RwLock::new(Ledger::new(1).unwrap()));
        {
            let mut guard = ledger.write().await;
            guard.register_peer(&short_addr);
            guard.register_peer(&long_addr);
        }
        let sync = Synchronizer::new(ledger.clone(), Duration::from_secs(2)).unwrap();

        assert!(sync.reconcile().await);
        assert_eq!(ledger.read().await.blocks, expected);
    })
    .await
    .expect("test_reconcile_prefers_longest_valid_chain timed out");
}

#[tokio::test]
async fn test_reconcile_tie_break_follows_address_order() {
    tokio::time::timeout(Duration::from_secs(30), async {
        // Two equally long chains with different content; the winner must
        // be the peer whose address sorts first
        let x = mined_ledger(2, 1, "xavier");
        let y = mined_ledger(2, 1, "yolanda");

        let mut chains_by_addr = BTreeMap::new();
        chains_by_addr.insert(serve(peer_node(x.clone())).await, x.blocks);
        chains_by_addr.insert(serve(peer_node(y.clone())).await, y.blocks);

        let ledger = Arc::new(RwLock::new(Ledger::new(1).unwrap()));
        {
            let mut guard = ledger.write().await;
            for addr in chains_by_addr.keys() {
                guard.register_peer(addr);
            }
        }
        let sync = Synchronizer::new(ledger.clone(), Duration::from_secs(2)).unwrap();

        assert!(sync.reconcile().await);
        let expected = chains_by_addr.values().next().unwrap();
        assert_eq!(&ledger.read().await.blocks, expected);
    })
    .await
    .expect("test_reconcile_tie_break_follows_address_order timed out");
}

#[tokio::test]
async fn test_reconcile_skips_dead_peer_but_uses_live_one() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let peer_ledger = mined_ledger(2, 1, "alice");
        let expected = peer_ledger.blocks.clone();
        let peer_addr = serve(peer_node(peer_ledger)).await;

        let ledger = Arc::new(RwLock::new(Ledger::new(1).unwrap()));
        {
            let mut guard = ledger.write().await;
            guard.register_peer("127.0.0.1:1");
            guard.register_peer(&peer_addr);
        }
        let sync = Synchronizer::new(ledger.clone(), Duration::from_secs(2)).unwrap();

        assert!(sync.reconcile().await);
        assert_eq!(ledger.read().await.blocks, expected);
    })
    .await
    .expect("test_reconcile_skips_dead_peer_but_uses_live_one timed out");
}

#[tokio::test]
async fn test_fetch_chain_rejects_malformed_payload() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let bogus = Router::new().route(
            "/chain",
            get(|| async { Json(json!({ "chain": "not a chain" })) }),
        );
        let addr = serve(bogus).await;

        let ledger = Arc::new(RwLock::new(Ledger::new(1).unwrap()));
        let sync = Synchronizer::new(ledger, Duration::from_secs(2)).unwrap();

        let err = sync.fetch_chain(&addr).await.unwrap_err();
        assert!(matches!(err, LedgerError::MalformedPeerPayload(_)));
    })
    .await
    .expect("test_fetch_chain_rejects_malformed_payload timed out");
}

#[tokio::test]
async fn test_consensus_endpoint_adopts_peer_chain() {
    tokio::time::timeout(Duration::from_secs(60), async {
        // Peer node mined over its own HTTP API
        let peer_api = Arc::new(
            Node::new(Ledger::new(1).unwrap(), Duration::from_secs(2), 1.0).unwrap(),
        );
        let peer_addr = serve(build_api_router(peer_api)).await;

        let client = reqwest::Client::new();
        for _ in 0..2 {
            let resp = client
                .get(format!("http://{}/mine", peer_addr))
                .send()
                .await
                .expect("mine request failed");
            assert!(resp.status().is_success());
        }

        // Fresh local node, driven through its own API
        let api_node = Arc::new(
            Node::new(Ledger::new(1).unwrap(), Duration::from_secs(2), 1.0).unwrap(),
        );
        let server =
            TestServer::new(build_api_router(api_node)).expect("Failed to create test server");

        let response = server.post("/nodes").json(&json!({ "node": peer_addr })).await;
        assert_eq!(response.status_code(), 200);

        let response = server.get("/consensus").await;
        assert_eq!(response.status_code(), 200);
        let body: Value = response.json();
        assert_eq!(body["replaced"], true);
        let chain = body["chain"].as_array().unwrap();
        assert_eq!(chain.len(), 3);

        // Adopted blocks still validate locally
        let blocks: Vec<Block> =
            serde_json::from_value(body["chain"].clone()).expect("chain should deserialize");
        assert!(tallychain::ledger::is_valid_chain(&blocks, 1));
    })
    .await
    .expect("test_consensus_endpoint_adopts_peer_chain timed out");
}
