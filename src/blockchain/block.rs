use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// Proof stored in the genesis block
pub const GENESIS_PROOF: u64 = 100;

/// Previous hash stored in the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Represents a block in the ledger
///
/// Field order matters: it is the order used on the wire and when hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Position of the block in the chain, starting at 1
    pub index: u64,

    /// Timestamp when the block was sealed
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Transactions included in this block, in arrival order
    pub transactions: Vec<Transaction>,

    /// Proof of work found for this block
    pub proof: u64,

    /// Hash of the previous block
    pub previous_hash: String,
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The transactions to include in the block
    /// * `proof` - The proof of work
    /// * `previous_hash` - The hash of the previous block
    pub fn new(index: u64, transactions: Vec<Transaction>, proof: u64, previous_hash: String) -> Self {
        Block {
            index,
            timestamp: Utc::now(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Creates the genesis block
    pub fn genesis() -> Self {
        Block::new(1, Vec::new(), GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block's canonical JSON form as a 64 character
    /// lowercase hexadecimal string
    pub fn hash(&self) -> String {
        // Serialized straight from the struct so the field order is fixed
        let block_bytes = serde_json::to_vec(self)
            .expect("block fields always serialize to JSON");

        let mut hasher = Sha256::new();
        hasher.update(&block_bytes);

        hex::encode(hasher.finalize())
    }
}

/// Hashes a block, see [`Block::hash`]
pub fn hash_block(block: &Block) -> String {
    block.hash()
}
