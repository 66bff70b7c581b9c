use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};
use thiserror::Error;

use super::block::Block;
use super::transaction::Transaction;

/// Errors that can occur during ledger operations
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Ledger has no blocks")]
    EmptyLedger,

    #[error("Chain tip moved: expected {expected}, found {found}")]
    StaleTip { expected: String, found: String },

    #[error("Candidate chain is empty")]
    EmptyCandidate,
}

/// State guarded by the ledger lock
#[derive(Debug)]
struct LedgerState {
    /// Immutable snapshot of the sealed blocks, swapped on every change
    chain: Arc<Vec<Block>>,

    /// Transactions waiting to be included in the next block
    pending_transactions: Vec<Transaction>,
}

/// Represents the ledger of a node
///
/// The block sequence and the pending buffer sit behind one lock. Readers
/// get an `Arc` snapshot of the chain, so they never see a half-built block
/// or a half-replaced chain.
#[derive(Debug)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates a new ledger holding only the genesis block
    pub fn new() -> Self {
        let genesis = Block::genesis();
        info!("Created genesis block at {}", genesis.timestamp);

        Ledger {
            state: RwLock::new(LedgerState {
                chain: Arc::new(vec![genesis]),
                pending_transactions: Vec::new(),
            }),
        }
    }

    /// Creates a ledger seeded with an existing chain
    ///
    /// The chain is taken as is; callers that got it from elsewhere should
    /// run it through the validator first.
    pub fn with_chain(chain: Vec<Block>) -> Result<Self, LedgerError> {
        if chain.is_empty() {
            return Err(LedgerError::EmptyCandidate);
        }

        Ok(Ledger {
            state: RwLock::new(LedgerState {
                chain: Arc::new(chain),
                pending_transactions: Vec::new(),
            }),
        })
    }

    // Every write finishes before its guard drops, so a poisoned lock still
    // holds consistent state.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a transaction to the pending buffer
    ///
    /// # Returns
    ///
    /// The index of the block that will include this transaction
    pub fn record_transaction(&self, transaction: Transaction) -> u64 {
        let mut state = self.write();
        state.pending_transactions.push(transaction);

        state.chain.len() as u64 + 1
    }

    /// Seals the pending transactions into a new block
    ///
    /// # Arguments
    ///
    /// * `proof` - The proof of work for the new block
    /// * `previous_hash` - Overrides the link to the previous block; the hash
    ///   of the current last block is used when `None`
    ///
    /// # Returns
    ///
    /// The newly appended block
    pub fn seal_block(&self, proof: u64, previous_hash: Option<String>) -> Block {
        let mut state = self.write();
        Self::seal_locked(&mut state, proof, previous_hash)
    }

    /// Seals a block only if the chain tip still hashes to `expected_tip`
    ///
    /// `extra` transactions are appended to the pending buffer just before
    /// sealing. On a moved tip nothing is touched.
    pub fn seal_block_on(
        &self,
        expected_tip: &str,
        proof: u64,
        extra: Vec<Transaction>,
    ) -> Result<Block, LedgerError> {
        let mut state = self.write();

        let found = state
            .chain
            .last()
            .map(Block::hash)
            .ok_or(LedgerError::EmptyLedger)?;

        if found != expected_tip {
            return Err(LedgerError::StaleTip {
                expected: expected_tip.to_string(),
                found,
            });
        }

        state.pending_transactions.extend(extra);
        Ok(Self::seal_locked(&mut state, proof, Some(found)))
    }

    fn seal_locked(state: &mut LedgerState, proof: u64, previous_hash: Option<String>) -> Block {
        let previous_hash = previous_hash
            .or_else(|| state.chain.last().map(Block::hash))
            .unwrap_or_default();

        let transactions = std::mem::take(&mut state.pending_transactions);
        let block = Block::new(state.chain.len() as u64 + 1, transactions, proof, previous_hash);

        let mut chain = Vec::with_capacity(state.chain.len() + 1);
        chain.extend_from_slice(&state.chain);
        chain.push(block.clone());
        state.chain = Arc::new(chain);

        debug!(
            "Sealed block {} with {} transactions",
            block.index,
            block.transactions.len()
        );

        block
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Result<Block, LedgerError> {
        self.read()
            .chain
            .last()
            .cloned()
            .ok_or(LedgerError::EmptyLedger)
    }

    /// Gets a snapshot of the entire chain
    pub fn chain(&self) -> Arc<Vec<Block>> {
        Arc::clone(&self.read().chain)
    }

    /// Gets the number of sealed blocks
    pub fn len(&self) -> usize {
        self.read().chain.len()
    }

    /// Always false once constructed
    pub fn is_empty(&self) -> bool {
        self.read().chain.is_empty()
    }

    /// Gets all pending transactions
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.read().pending_transactions.clone()
    }

    /// Replaces the chain if the candidate is strictly longer
    ///
    /// The length comparison and the swap happen under the same lock. The
    /// candidate must already be validated. Pending transactions are kept.
    ///
    /// # Returns
    ///
    /// true if the chain was replaced
    pub fn replace_if_longer(&self, candidate: Vec<Block>) -> bool {
        let mut state = self.write();

        if candidate.len() <= state.chain.len() {
            return false;
        }

        info!(
            "Replacing chain of length {} with chain of length {}",
            state.chain.len(),
            candidate.len()
        );
        state.chain = Arc::new(candidate);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::proof::ProofOfWork;
    use crate::blockchain::validation::is_valid_chain;

    fn mine_next(ledger: &Ledger) -> Block {
        let last = ledger.last_block().unwrap();
        ledger.seal_block(ProofOfWork::default().find_proof(last.proof), None)
    }

    #[test]
    fn test_new_ledger() {
        let ledger = Ledger::new();
        let chain = ledger.chain();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index, 1);
        assert_eq!(chain[0].proof, 100);
        assert_eq!(chain[0].previous_hash, "1");
        assert!(!ledger.is_empty());
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_record_transaction() {
        let ledger = Ledger::new();

        let index = ledger.record_transaction(Transaction::new("A", "B", 5.0).unwrap());
        assert_eq!(index, 2);

        let index = ledger.record_transaction(Transaction::new("B", "C", 1.0).unwrap());
        assert_eq!(index, 2);

        let pending = ledger.pending_transactions();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].sender, "A");
        assert_eq!(pending[1].sender, "B");
    }

    #[test]
    fn test_seal_block() {
        let ledger = Ledger::new();
        let genesis = ledger.last_block().unwrap();
        let transaction = Transaction::new("A", "B", 5.0).unwrap();
        ledger.record_transaction(transaction.clone());

        let block = mine_next(&ledger);

        assert_eq!(ledger.len(), 2);
        assert_eq!(block.index, 2);
        assert_eq!(block.transactions, vec![transaction]);
        assert_eq!(block.previous_hash, genesis.hash());
        assert!(ledger.pending_transactions().is_empty());
        assert_eq!(ledger.last_block().unwrap(), block);
        assert!(is_valid_chain(&ledger.chain()));
    }

    #[test]
    fn test_seal_block_with_override() {
        let ledger = Ledger::new();
        let block = ledger.seal_block(7, Some("override".to_string()));

        assert_eq!(block.previous_hash, "override");
        assert_eq!(block.index, 2);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_seals() {
        let ledger = Ledger::new();
        let snapshot = ledger.chain();

        mine_next(&ledger);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_seal_block_on_current_tip() {
        let ledger = Ledger::new();
        let tip = ledger.last_block().unwrap();
        ledger.record_transaction(Transaction::new("A", "B", 5.0).unwrap());

        let block = ledger
            .seal_block_on(&tip.hash(), 35293, vec![Transaction::reward("miner")])
            .unwrap();

        assert_eq!(block.transactions.len(), 2);
        assert!(block.transactions[1].is_reward());
        assert_eq!(block.previous_hash, tip.hash());
    }

    #[test]
    fn test_seal_block_on_stale_tip_changes_nothing() {
        let ledger = Ledger::new();
        ledger.record_transaction(Transaction::new("A", "B", 5.0).unwrap());

        let result = ledger.seal_block_on("not-the-tip", 35293, vec![Transaction::reward("miner")]);

        assert!(matches!(result, Err(LedgerError::StaleTip { .. })));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn test_replace_if_longer() {
        let longer = Ledger::new();
        mine_next(&longer);
        mine_next(&longer);

        let ledger = Ledger::new();
        ledger.record_transaction(Transaction::new("A", "B", 5.0).unwrap());

        assert!(ledger.replace_if_longer(longer.chain().to_vec()));
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn test_replace_requires_strictly_longer() {
        let other = Ledger::new();
        mine_next(&other);

        let ledger = Ledger::new();
        mine_next(&ledger);
        let before = ledger.chain();

        assert!(!ledger.replace_if_longer(other.chain().to_vec()));
        assert!(!ledger.replace_if_longer(vec![Block::genesis()]));
        assert_eq!(ledger.chain(), before);
    }

    #[test]
    fn test_with_chain() {
        assert_eq!(
            Ledger::with_chain(Vec::new()).unwrap_err(),
            LedgerError::EmptyCandidate
        );

        let ledger = Ledger::with_chain(vec![Block::genesis()]).unwrap();
        assert_eq!(ledger.len(), 1);
    }
}
