use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::peers::PeerError;
use crate::blockchain::Block;

/// Default bound on a single peer request
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// A chain as reported by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// The length of the chain
    pub length: usize,
}

impl ChainResponse {
    pub fn new(chain: Vec<Block>) -> Self {
        ChainResponse {
            length: chain.len(),
            chain,
        }
    }
}

/// Fetches chains from peer nodes
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetches the chain reported by the peer at `address` (`host[:port]`)
    async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, PeerError>;
}

#[async_trait]
impl<T: PeerClient + ?Sized> PeerClient for std::sync::Arc<T> {
    async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, PeerError> {
        (**self).fetch_chain(address).await
    }
}

/// Peer client speaking the node's own HTTP API
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    /// Creates a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, PeerError> {
        let url = format!("http://{}/chain", address);

        let response = self.client.get(&url).send().await.map_err(|e| PeerError::Unreachable {
            peer: address.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(PeerError::InvalidResponse {
                peer: address.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        response
            .json::<ChainResponse>()
            .await
            .map_err(|e| PeerError::InvalidResponse {
                peer: address.to_string(),
                reason: e.to_string(),
            })
    }
}
