//! tallychain - A minimal proof-of-work ledger for a single node
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`ledger`] - Chain entities, node state and chain validation
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work puzzle and proof search
//!
//! ## Cryptography
//! - [`crypto`] - Canonical fingerprinting (SHA-256)
//!
//! ## Networking & Integration
//! - [`sync`] - Peer reconciliation (longest valid chain)
//! - [`api`] - HTTP API server
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`node`] - Node orchestrator

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod ledger;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Networking
// ============================================================================
pub mod sync;

// ============================================================================
// Integration
// ============================================================================
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod node;
