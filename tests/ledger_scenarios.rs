//! End-to-end ledger scenarios
//!
//! Nodes are plain in-process ledgers; peer fetches go through an in-memory
//! client so no sockets are involved.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use pow_ledger::blockchain::{
    is_valid_chain, Block, ChainValidator, ConflictResolver, Ledger, PeerError, PeerSet,
    ProofOfWork, Transaction,
};
use pow_ledger::network::{ChainResponse, PeerClient};

/// Serves each registered node's current chain
struct InMemoryNetwork {
    nodes: HashMap<String, Arc<Ledger>>,
}

#[async_trait]
impl PeerClient for InMemoryNetwork {
    async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, PeerError> {
        self.nodes
            .get(address)
            .map(|ledger| ChainResponse::new(ledger.chain().to_vec()))
            .ok_or_else(|| PeerError::Unreachable {
                peer: address.to_string(),
                reason: "no such node".to_string(),
            })
    }
}

/// Serves a fixed response for every peer
struct FixedResponse(ChainResponse);

#[async_trait]
impl PeerClient for FixedResponse {
    async fn fetch_chain(&self, _address: &str) -> Result<ChainResponse, PeerError> {
        Ok(self.0.clone())
    }
}

fn grow(ledger: &Ledger, length: usize) {
    let pow = ProofOfWork::default();

    while ledger.len() < length {
        let last = ledger.last_block().unwrap();
        ledger.record_transaction(Transaction::new("miner", "someone", 1.0).unwrap());
        ledger.seal_block(pow.find_proof(last.proof), None);
    }
}

fn node_of_length(length: usize) -> Arc<Ledger> {
    let ledger = Arc::new(Ledger::new());
    grow(&ledger, length);
    ledger
}

#[test]
fn test_single_transaction_sealed_into_block_two() {
    let ledger = Ledger::new();
    assert_eq!(ledger.len(), 1);

    let transaction = Transaction::new("A", "B", 5.0).unwrap();
    assert_eq!(ledger.record_transaction(transaction.clone()), 2);

    let genesis = ledger.last_block().unwrap();
    let proof = ProofOfWork::default().find_proof(genesis.proof);
    let block = ledger.seal_block(proof, None);

    assert_eq!(ledger.len(), 2);
    assert_eq!(block.transactions, vec![transaction]);
    assert_eq!(block.previous_hash, genesis.hash());
    assert!(ledger.pending_transactions().is_empty());
    assert!(is_valid_chain(&ledger.chain()));
}

#[tokio::test]
async fn test_longest_valid_peer_chain_wins() {
    let x = node_of_length(3);
    let y = node_of_length(5);
    let z = node_of_length(3);

    let peers = Arc::new(PeerSet::new());
    peers.register("http://node-x:5000").unwrap();
    peers.register("http://node-y:5000").unwrap();

    let network = InMemoryNetwork {
        nodes: HashMap::from([
            ("node-x:5000".to_string(), x),
            ("node-y:5000".to_string(), y.clone()),
        ]),
    };

    let resolver = ConflictResolver::new(z.clone(), peers, network, ChainValidator::default());

    assert!(resolver.resolve().await);
    assert_eq!(z.len(), 5);
    assert_eq!(z.chain(), y.chain());

    // A second pass finds nothing longer
    assert!(!resolver.resolve().await);
    assert_eq!(z.len(), 5);
}

#[tokio::test]
async fn test_longer_invalid_chain_is_ignored() {
    let z = node_of_length(4);
    let before = z.chain();

    let mut forged = node_of_length(6).chain().to_vec();
    forged[3].previous_hash = "f".repeat(64);
    assert!(!is_valid_chain(&forged));

    let peers = Arc::new(PeerSet::new());
    peers.register("node-w:5000").unwrap();

    let resolver = ConflictResolver::new(
        z.clone(),
        peers,
        FixedResponse(ChainResponse::new(forged)),
        ChainValidator::default(),
    );

    assert!(!resolver.resolve().await);
    assert_eq!(z.len(), 4);
    assert_eq!(z.chain(), before);
}

#[tokio::test]
async fn test_unreachable_peers_never_shorten_the_chain() {
    let z = node_of_length(2);

    let peers = Arc::new(PeerSet::new());
    peers.register("gone-1:5000").unwrap();
    peers.register("gone-2:5000").unwrap();

    let network = InMemoryNetwork {
        nodes: HashMap::from([("short:5000".to_string(), Arc::new(Ledger::new()))]),
    };
    peers.register("short:5000").unwrap();

    let resolver = ConflictResolver::new(z.clone(), peers, network, ChainValidator::default());
    let outcome = resolver.resolve_detailed().await;

    assert!(!outcome.replaced);
    assert_eq!(outcome.chain.len(), 2);
    assert_eq!(outcome.skipped.len(), 2);
}

#[test]
fn test_proof_after_genesis_is_reproducible() {
    let proof = ProofOfWork::default().find_proof(100);

    let digest = hex::encode(Sha256::digest(format!("100{}", proof).as_bytes()));
    assert!(digest.starts_with("0000"));
    assert_eq!(proof, 35293);
}

#[test]
fn test_chain_survives_json_exchange() {
    let ledger = node_of_length(3);
    let json = serde_json::to_string(&ChainResponse::new(ledger.chain().to_vec())).unwrap();

    let received: ChainResponse = serde_json::from_str(&json).unwrap();
    let blocks: Vec<Block> = received.chain;

    assert_eq!(received.length, 3);
    assert!(is_valid_chain(&blocks));
}
