use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Sender used for the mining reward transaction
pub const REWARD_SENDER: &str = "0";

/// Amount paid to the miner for each sealed block
pub const MINING_REWARD: f64 = 1.0;

/// Errors that can occur when building a transaction
#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// Represents a transfer between two parties
///
/// Transactions carry no signature and no balance check. They are accepted
/// as received and kept in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Identifier of the sender
    pub sender: String,

    /// Identifier of the recipient
    pub recipient: String,

    /// Amount being transferred
    pub amount: f64,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - The identifier of the sender
    /// * `recipient` - The identifier of the recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// The transaction, or `MalformedInput` if an identifier is blank or
    /// the amount is not a finite number
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Result<Self, TransactionError> {
        let sender = sender.into();
        let recipient = recipient.into();

        if sender.trim().is_empty() {
            return Err(TransactionError::MalformedInput(
                "sender must not be empty".to_string(),
            ));
        }

        if recipient.trim().is_empty() {
            return Err(TransactionError::MalformedInput(
                "recipient must not be empty".to_string(),
            ));
        }

        if !amount.is_finite() {
            return Err(TransactionError::MalformedInput(format!(
                "amount must be a finite number, got {}",
                amount
            )));
        }

        Ok(Transaction {
            sender,
            recipient,
            amount,
        })
    }

    /// Creates the reward transaction paid to a miner
    pub fn reward(node_id: impl Into<String>) -> Self {
        Transaction {
            sender: REWARD_SENDER.to_string(),
            recipient: node_id.into(),
            amount: MINING_REWARD,
        }
    }

    /// Checks if the transaction is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
