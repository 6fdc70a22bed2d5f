//! REST API server for tallychain
//!
//! Exposes the ledger over HTTP: chain inspection, transfer submission,
//! mining, peer registration and reconciliation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::miner;
use crate::sync::Synchronizer;

/// Sender recorded on mining reward transfers.
pub const REWARD_SENDER: &str = "0";

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct Node {
    pub ledger: Arc<RwLock<Ledger>>,
    pub synchronizer: Arc<Synchronizer>,
    /// Identity credited by mining rewards, generated fresh per process.
    pub node_id: String,
    pub reward_amount: f64,
    // Optional shared orchestrator state (NodeState) for health checks and logging
    pub state: Option<Arc<RwLock<crate::node::NodeState>>>,
}

impl Node {
    /// Create a standalone node around `ledger`. Used by tests and tools
    /// that do not run the full orchestrator.
    pub fn new(
        ledger: Ledger,
        peer_timeout: Duration,
        reward_amount: f64,
    ) -> Result<Self, reqwest::Error> {
        let ledger = Arc::new(RwLock::new(ledger));
        let synchronizer = Arc::new(Synchronizer::new(ledger.clone(), peer_timeout)?);

        Ok(Self {
            ledger,
            synchronizer,
            node_id: generate_node_id(),
            reward_amount,
            state: None,
        })
    }

    /// Create an API node that shares the provided ledger and synchronizer
    /// instances. This is how the `tally-node` orchestrator integrates the
    /// API server so both services observe the same in-memory chain and
    /// peer set.
    pub fn new_shared(
        ledger: Arc<RwLock<Ledger>>,
        synchronizer: Arc<Synchronizer>,
        reward_amount: f64,
        state: Option<Arc<RwLock<crate::node::NodeState>>>,
    ) -> Self {
        Self {
            ledger,
            synchronizer,
            node_id: generate_node_id(),
            reward_amount,
            state,
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    InvalidInput(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /transactions`. Fields are optional so a missing one is
/// reported as a 400 with a message rather than a deserialization failure.
#[derive(Deserialize)]
pub struct NewTransferRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<f64>,
}

/// Body of `POST /nodes`.
#[derive(Deserialize)]
pub struct RegisterPeerRequest {
    pub node: Option<String>,
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Random 32-character hex identity. Stands in for a wallet address when
/// crediting mining rewards.
fn generate_node_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware. Logs method, path, status, duration and
/// current `NodeState` (when available).
async fn logging_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    let node_state = if let Some(s) = &node.state {
        format!("{:?}", s.read().await.clone())
    } else {
        "unknown".to_string()
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        node_state = %node_state,
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (for testing)
pub fn build_api_router(node: Arc<Node>) -> Router {
    // CORS configuration - allow all origins with credentials
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request()) // Reflect the request's origin
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ]) // Explicitly allow methods
        .allow_headers(vec![http::header::CONTENT_TYPE]) // Explicitly allow headers
        .allow_credentials(true);

    Router::new()
        // Ledger endpoints
        .route("/", get(ledger_state))
        .route("/chain", get(full_chain))
        .route("/pending", get(pending_transfers))
        // Transfer endpoints
        .route("/transactions", post(submit_transfer))
        // Mining endpoints
        .route("/mine", get(mine))
        // Network endpoints
        .route("/consensus", get(run_consensus))
        .route("/nodes", post(register_peer).get(list_peers))
        // System endpoints
        .route("/health", get(health_check))
        .layer(middleware::from_fn_with_state(
            node.clone(),
            logging_middleware,
        ))
        .with_state(node)
        .layer(cors)
}

/// Run the API server on `port`, binding all interfaces.
pub async fn run_api_server(
    node: Arc<Node>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("🚀 API server listening on http://{}", addr);
    println!("🔗 Chain endpoint at http://{}/chain", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    // If the orchestrator provided a `NodeState`, use it to determine health.
    if let Some(s) = &node.state {
        let state = s.read().await.clone();
        match state {
            crate::node::NodeState::Ready => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "healthy",
                    "node_state": format!("{:?}", state),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
                .into_response(),
            _ => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "node_state": format!("{:?}", state),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
                .into_response(),
        }
    } else {
        // No orchestrator state attached; assume healthy
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        )
            .into_response()
    }
}

/// Full node state dump: chain, pending pool, peers and difficulty.
async fn ledger_state(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let ledger = node.ledger.read().await;
    Json(ledger.clone())
}

async fn full_chain(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let ledger = node.ledger.read().await;
    Json(serde_json::json!({
        "chain": ledger.blocks.clone()
    }))
}

async fn pending_transfers(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let ledger = node.ledger.read().await;
    Json(serde_json::json!({
        "count": ledger.pending.len(),
        "transfers": ledger.pending.clone()
    }))
}

async fn submit_transfer(
    State(node): State<Arc<Node>>,
    Json(req): Json<NewTransferRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (sender, recipient, amount) = match (req.sender, req.recipient, req.amount) {
        (Some(sender), Some(recipient), Some(amount)) => (sender, recipient, amount),
        _ => {
            return Err(LedgerError::InvalidTransferInput(
                "required fields: sender, recipient, amount".to_string(),
            )
            .into())
        }
    };

    let mut ledger = node.ledger.write().await;
    let transfer = ledger.submit_transfer(&sender, &recipient, amount);

    Ok(Json(serde_json::json!({
        "transfer": transfer,
        "block_index": ledger.next_index()
    })))
}

/// Seal a new block: solve the puzzle off the ledger lock, then credit the
/// mining reward and seal in a single write-lock critical section.
async fn mine(State(node): State<Arc<Node>>) -> Result<Json<serde_json::Value>, ApiError> {
    let (last_proof, difficulty) = {
        let ledger = node.ledger.read().await;
        (ledger.last_block()?.proof, ledger.difficulty)
    };

    // The search is CPU-bound and unbounded, so it runs on the blocking
    // pool while other requests keep using the ledger.
    let proof = tokio::task::spawn_blocking(move || miner::find_proof(last_proof, difficulty))
        .await
        .map_err(|e| ApiError::Internal(format!("proof search failed: {}", e)))?;

    let mut ledger = node.ledger.write().await;
    let (tip_proof, previous_fingerprint) = {
        let tip = ledger.last_block()?;
        (tip.proof, tip.fingerprint()?)
    };
    if tip_proof != last_proof {
        tracing::warn!(
            expected = last_proof,
            found = tip_proof,
            "chain tip moved during proof search"
        );
    }

    let reward = ledger.submit_transfer(REWARD_SENDER, &node.node_id, node.reward_amount);
    let block = ledger.seal_block(proof, Some(previous_fingerprint))?;

    tracing::info!(index = block.index, proof = block.proof, "mining successful");

    Ok(Json(serde_json::json!({
        "message": "Mining Successful",
        "block": block,
        "reward": reward
    })))
}

async fn run_consensus(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let replaced = node.synchronizer.reconcile().await;

    let ledger = node.ledger.read().await;
    Json(serde_json::json!({
        "replaced": replaced,
        "chain": ledger.blocks.clone()
    }))
}

async fn register_peer(
    State(node): State<Arc<Node>>,
    Json(req): Json<RegisterPeerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let peer = match req.node {
        Some(peer) if !peer.trim().is_empty() => peer,
        _ => return Err(ApiError::InvalidInput("`node` required".to_string())),
    };

    let mut ledger = node.ledger.write().await;
    let message = if ledger.register_peer(&peer) {
        "New node has been added"
    } else {
        "Node already registered"
    };

    Ok(Json(serde_json::json!({
        "message": message,
        "nodes": ledger.peers.clone()
    })))
}

async fn list_peers(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let ledger = node.ledger.read().await;
    Json(serde_json::json!({
        "count": ledger.peers.len(),
        "nodes": ledger.peers.clone()
    }))
}
