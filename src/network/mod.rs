// Network module
//
// This module contains the client used to talk to peer nodes

pub mod client;

// Re-export main components for easier access
pub use client::{ChainResponse, HttpPeerClient, PeerClient};
