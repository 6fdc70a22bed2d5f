use crate::config::load_config;
use crate::ledger::Ledger;
use crate::sync::Synchronizer;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Syncing,
    Ready,
    Degraded,
}

pub struct Node {
    pub config: crate::config::Config,
    pub ledger: Arc<RwLock<Ledger>>,
    pub synchronizer: Arc<Synchronizer>,
    pub state: Arc<RwLock<NodeState>>,
}

impl Node {
    pub async fn init() -> Result<Self, Box<dyn std::error::Error>> {
        // Load and validate config
        let config = load_config()?;

        tracing_subscriber::fmt::init();
        info!(
            "Starting tallychain node (difficulty = {})",
            config.mining.difficulty
        );

        // Fresh single-block chain; peers arrive from config or `POST /nodes`
        let mut ledger = Ledger::new(config.mining.difficulty)?;
        for peer in &config.network.bootstrap_peers {
            ledger.register_peer(peer);
        }

        let ledger = Arc::new(RwLock::new(ledger));
        let state = Arc::new(RwLock::new(NodeState::Booting));

        let synchronizer = Arc::new(Synchronizer::new(
            ledger.clone(),
            Duration::from_secs(config.network.peer_timeout_secs),
        )?);

        Ok(Self {
            config,
            ledger,
            synchronizer,
            state,
        })
    }

    pub async fn start(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error>> {
        // Enforce deterministic startup order.
        // 1) Ensure API port is available before anything else spins up
        let api_port = self.config.network.api_port;
        let api_bind = format!("0.0.0.0:{}", api_port);
        TcpListener::bind(&api_bind)
            .map_err(|e| format!("API port {} unavailable: {}", api_port, e))?;

        // 2) Start API server (spawned so we can proceed)
        let api_node = crate::api::Node::new_shared(
            self.ledger.clone(),
            self.synchronizer.clone(),
            self.config.mining.reward_amount,
            Some(self.state.clone()),
        );
        let api_node = Arc::new(api_node);
        let _api_task = tokio::spawn(async move {
            if let Err(e) = crate::api::run_api_server(api_node, api_port).await {
                error!("API server failed: {}", e);
            }
        });
        // give the server a moment to bind/listen
        tokio::time::sleep(Duration::from_millis(200)).await;

        // 3) Transition to Syncing and run one reconciliation sweep against
        // any bootstrap peers, then become Ready
        {
            let mut s = self.state.write().await;
            *s = NodeState::Syncing;
        }

        if !self.config.network.bootstrap_peers.is_empty() {
            let replaced = self.synchronizer.reconcile().await;
            info!(replaced, "startup reconciliation complete");
        }

        {
            let mut s = self.state.write().await;
            *s = NodeState::Ready;
        }

        // Background reconciliation loop, when configured
        let interval = self.config.network.reconcile_interval_secs;
        if interval > 0 {
            let synchronizer = self.synchronizer.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_secs(interval)).await;
                    if synchronizer.reconcile().await {
                        info!("background reconciliation adopted a peer chain");
                    }
                }
            });
        }

        // Node main loop - health logging
        loop {
            info!(
                "Node running: chain height = {}",
                self.ledger.read().await.blocks.len()
            );
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    }
}
