// Blockchain module
//
// This module contains the core ledger implementation including:
// - Block structure and hashing
// - Transaction structure
// - Proof of work algorithm
// - Ledger with pending transactions
// - Chain validation
// - Peer registry and conflict resolution
// - Mining rounds

pub mod block;
pub mod chain;
pub mod consensus;
pub mod miner;
pub mod peers;
pub mod proof;
pub mod transaction;
pub mod validation;

// Re-export main components for easier access
pub use block::{hash_block, Block};
pub use chain::{Ledger, LedgerError};
pub use consensus::{ConflictResolver, ResolveOutcome};
pub use miner::{MineError, Miner};
pub use peers::{PeerError, PeerSet};
pub use proof::ProofOfWork;
pub use transaction::{Transaction, TransactionError};
pub use validation::{is_valid_chain, ChainError, ChainValidator};
