use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use super::block::Block;
use super::chain::{Ledger, LedgerError};
use super::proof::ProofOfWork;
use super::transaction::Transaction;

/// Errors that can occur during a mining round
#[derive(Debug, Error)]
pub enum MineError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Proof-of-work worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Runs mining rounds against a shared ledger
///
/// The proof search runs on a blocking worker without holding the ledger
/// lock. Only one round runs at a time per miner.
pub struct Miner {
    ledger: Arc<Ledger>,
    pow: ProofOfWork,
    node_id: String,
    round: Mutex<()>,
}

impl Miner {
    pub fn new(ledger: Arc<Ledger>, pow: ProofOfWork, node_id: impl Into<String>) -> Self {
        Miner {
            ledger,
            pow,
            node_id: node_id.into(),
            round: Mutex::new(()),
        }
    }

    /// Identifier credited with mining rewards
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Mines one block with the pending transactions plus the reward
    ///
    /// If the chain is replaced while searching, the search restarts on the
    /// new tip.
    pub async fn mine(&self) -> Result<Block, MineError> {
        let _round = self.round.lock().await;

        loop {
            let tip = self.ledger.last_block()?;
            let tip_hash = tip.hash();
            let pow = self.pow;
            let last_proof = tip.proof;

            let proof = tokio::task::spawn_blocking(move || pow.find_proof(last_proof)).await?;

            match self
                .ledger
                .seal_block_on(&tip_hash, proof, vec![Transaction::reward(&self.node_id)])
            {
                Ok(block) => {
                    info!("Forged block {} with proof {}", block.index, block.proof);
                    return Ok(block);
                }
                Err(LedgerError::StaleTip { .. }) => {
                    warn!("Chain changed while mining on block {}, retrying", tip.index);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
