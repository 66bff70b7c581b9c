use std::sync::Arc;

use futures::future::join_all;
use log::{info, warn};

use super::block::Block;
use super::chain::Ledger;
use super::peers::{PeerError, PeerSet};
use super::validation::ChainValidator;
use crate::network::{ChainResponse, PeerClient};

/// Result of one conflict resolution pass
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    /// Whether the local chain was replaced
    pub replaced: bool,

    /// The local chain after resolution
    pub chain: Arc<Vec<Block>>,

    /// Peers that were skipped, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Applies the longest valid chain rule against registered peers
pub struct ConflictResolver<C> {
    ledger: Arc<Ledger>,
    peers: Arc<PeerSet>,
    client: C,
    validator: ChainValidator,
}

impl<C: PeerClient> ConflictResolver<C> {
    pub fn new(ledger: Arc<Ledger>, peers: Arc<PeerSet>, client: C, validator: ChainValidator) -> Self {
        ConflictResolver {
            ledger,
            peers,
            client,
            validator,
        }
    }

    /// Adopts the longest valid peer chain if it beats the local one
    ///
    /// # Returns
    ///
    /// true if the local chain was replaced
    pub async fn resolve(&self) -> bool {
        self.resolve_detailed().await.replaced
    }

    /// Same as [`ConflictResolver::resolve`], also reporting skipped peers
    pub async fn resolve_detailed(&self) -> ResolveOutcome {
        let addresses = self.peers.addresses();

        // Fetched without touching the ledger lock
        let responses = join_all(
            addresses
                .iter()
                .map(|address| self.client.fetch_chain(address)),
        )
        .await;

        let mut best_length = self.ledger.len();
        let mut best: Option<Vec<Block>> = None;
        let mut skipped = Vec::new();

        for (address, response) in addresses.into_iter().zip(responses) {
            match self.accept_candidate(&address, response, best_length) {
                Ok(Some(chain)) => {
                    best_length = chain.len();
                    best = Some(chain);
                }
                Ok(None) => {}
                Err(reason) => {
                    warn!("Skipping peer {}: {}", address, reason);
                    skipped.push((address, reason));
                }
            }
        }

        let replaced = match best {
            Some(chain) => self.ledger.replace_if_longer(chain),
            None => false,
        };

        if replaced {
            info!("Chain replaced by a peer chain of length {}", best_length);
        } else {
            info!("Local chain of length {} is authoritative", self.ledger.len());
        }

        ResolveOutcome {
            replaced,
            chain: self.ledger.chain(),
            skipped,
        }
    }

    /// Checks one peer's answer, returning its chain if it is the new best
    fn accept_candidate(
        &self,
        address: &str,
        response: Result<ChainResponse, PeerError>,
        best_length: usize,
    ) -> Result<Option<Vec<Block>>, String> {
        let response = response.map_err(|e| e.to_string())?;

        if response.length != response.chain.len() {
            return Err(PeerError::InvalidResponse {
                peer: address.to_string(),
                reason: format!(
                    "reported length {} but sent {} blocks",
                    response.length,
                    response.chain.len()
                ),
            }
            .to_string());
        }

        if response.length <= best_length {
            return Ok(None);
        }

        self.validator
            .check_chain(&response.chain)
            .map_err(|e| format!("invalid candidate chain: {}", e))?;

        Ok(Some(response.chain))
    }
}
