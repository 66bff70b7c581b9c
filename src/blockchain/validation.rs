use thiserror::Error;

use super::block::Block;
use super::proof::ProofOfWork;

/// Reasons a candidate chain is rejected
#[derive(Debug, Error, PartialEq)]
pub enum ChainError {
    #[error("Chain is empty")]
    Empty,

    #[error("Chain starts at index {index}, expected 1")]
    BadFirstIndex { index: u64 },

    #[error("Block {index} does not follow index {previous}")]
    IndexGap { index: u64, previous: u64 },

    #[error("Block {index} has previous_hash {found}, expected {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },

    #[error("Block {index} carries invalid proof {proof} for previous proof {last_proof}")]
    InvalidProof {
        index: u64,
        last_proof: u64,
        proof: u64,
    },
}

/// Verifies hash linkage and proofs across a whole chain
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainValidator {
    pow: ProofOfWork,
}

impl ChainValidator {
    pub fn new(pow: ProofOfWork) -> Self {
        ChainValidator { pow }
    }

    /// Checks a candidate chain, reporting the first violation found
    ///
    /// The first block must have index 1. Every block after it must carry
    /// the next index, link to the hash of its predecessor and hold a proof
    /// valid for its predecessor's proof.
    pub fn check_chain(&self, chain: &[Block]) -> Result<(), ChainError> {
        let first = chain.first().ok_or(ChainError::Empty)?;

        if first.index != 1 {
            return Err(ChainError::BadFirstIndex { index: first.index });
        }

        for pair in chain.windows(2) {
            let (previous, block) = (&pair[0], &pair[1]);

            if previous.index.checked_add(1) != Some(block.index) {
                return Err(ChainError::IndexGap {
                    index: block.index,
                    previous: previous.index,
                });
            }

            let expected = previous.hash();
            if block.previous_hash != expected {
                return Err(ChainError::BrokenLink {
                    index: block.index,
                    expected,
                    found: block.previous_hash.clone(),
                });
            }

            if !self.pow.is_valid_proof(previous.proof, block.proof) {
                return Err(ChainError::InvalidProof {
                    index: block.index,
                    last_proof: previous.proof,
                    proof: block.proof,
                });
            }
        }

        Ok(())
    }

    /// Returns true if the chain passes [`ChainValidator::check_chain`]
    pub fn is_valid_chain(&self, chain: &[Block]) -> bool {
        self.check_chain(chain).is_ok()
    }
}

/// Validates a chain at the default difficulty
pub fn is_valid_chain(chain: &[Block]) -> bool {
    ChainValidator::default().is_valid_chain(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chain::Ledger;
    use crate::blockchain::transaction::Transaction;

    fn valid_chain(blocks: usize) -> Vec<Block> {
        let pow = ProofOfWork::default();
        let ledger = Ledger::new();

        while ledger.len() < blocks {
            let last = ledger.last_block().unwrap();
            ledger
                .record_transaction(Transaction::new("A", "B", ledger.len() as f64).unwrap());
            ledger.seal_block(pow.find_proof(last.proof), None);
        }

        ledger.chain().to_vec()
    }

    #[test]
    fn test_single_block_chain_is_valid() {
        assert!(is_valid_chain(&[Block::genesis()]));
    }

    #[test]
    fn test_empty_chain_is_invalid() {
        assert_eq!(ChainValidator::default().check_chain(&[]), Err(ChainError::Empty));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let chain = valid_chain(3);

        assert_eq!(chain.len(), 3);
        assert!(is_valid_chain(&chain));
    }

    #[test]
    fn test_flipped_previous_hash_is_rejected() {
        let mut chain = valid_chain(3);

        // Flip one character of the link
        let mut bytes = chain[2].previous_hash.clone().into_bytes();
        bytes[0] = if bytes[0] == b'0' { b'1' } else { b'0' };
        chain[2].previous_hash = String::from_utf8(bytes).unwrap();

        assert!(matches!(
            ChainValidator::default().check_chain(&chain),
            Err(ChainError::BrokenLink { index: 3, .. })
        ));
    }

    #[test]
    fn test_decremented_proof_is_rejected() {
        let mut chain = valid_chain(2);
        chain[1].proof -= 1;

        assert!(matches!(
            ChainValidator::default().check_chain(&chain),
            Err(ChainError::InvalidProof { index: 2, .. })
        ));
    }

    #[test]
    fn test_tampered_block_breaks_next_link() {
        let mut chain = valid_chain(3);
        chain[1].transactions[0].amount = 1_000.0;

        assert!(matches!(
            ChainValidator::default().check_chain(&chain),
            Err(ChainError::BrokenLink { index: 3, .. })
        ));
    }

    #[test]
    fn test_chain_must_start_at_index_one() {
        let pow = ProofOfWork::default();
        let mut chain = vec![Block::genesis()];
        chain[0].index = 50;

        // Correctly linked from a shifted base
        for _ in 0..2 {
            let previous = chain.last().unwrap().clone();
            chain.push(Block::new(
                previous.index + 1,
                Vec::new(),
                pow.find_proof(previous.proof),
                previous.hash(),
            ));
        }

        assert_eq!(
            ChainValidator::default().check_chain(&chain),
            Err(ChainError::BadFirstIndex { index: 50 })
        );
        assert!(!is_valid_chain(&chain[..1]));
    }

    #[test]
    fn test_index_gap_is_rejected() {
        let mut chain = valid_chain(2);
        chain[1].index = 5;

        assert_eq!(
            ChainValidator::default().check_chain(&chain),
            Err(ChainError::IndexGap { index: 5, previous: 1 })
        );
    }
}
