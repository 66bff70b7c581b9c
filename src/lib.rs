//! Proof-of-work ledger node
//!
//! An append-only ledger shared across independent nodes. Each node extends
//! its chain with proof-of-work and resolves divergence by adopting the
//! longest valid chain among its peers.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod network;
