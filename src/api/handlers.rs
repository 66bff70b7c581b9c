use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{
    Block, ChainValidator, ConflictResolver, Ledger, Miner, PeerSet, ProofOfWork, Transaction,
};
use crate::network::{ChainResponse, PeerClient};

/// Shared state handed to every handler
pub struct NodeState {
    pub ledger: Arc<Ledger>,
    pub peers: Arc<PeerSet>,
    pub miner: Miner,
    pub resolver: ConflictResolver<Arc<dyn PeerClient>>,
    pub validator: ChainValidator,
}

impl NodeState {
    /// Wires a node around a fresh genesis ledger
    pub fn new(pow: ProofOfWork, node_id: impl Into<String>, client: Arc<dyn PeerClient>) -> Self {
        let ledger = Arc::new(Ledger::new());
        let peers = Arc::new(PeerSet::new());
        let validator = ChainValidator::new(pow);

        NodeState {
            miner: Miner::new(ledger.clone(), pow, node_id),
            resolver: ConflictResolver::new(ledger.clone(), peers.clone(), client, validator),
            ledger,
            peers,
            validator,
        }
    }
}

/// Data structure for the node state
pub type NodeData = web::Data<NodeState>;

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's identifier
    pub sender: String,

    /// The recipient's identifier
    pub recipient: String,

    /// The amount to transfer
    pub amount: f64,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The index of the block that will include this transaction
    pub block_index: u64,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// Index of the forged block
    pub index: u64,

    /// Transactions sealed into the block
    pub transactions: Vec<Transaction>,

    /// Proof of work of the block
    pub proof: u64,

    /// Hash of the previous block
    pub previous_hash: String,
}

/// Request for the node registration endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterNodesRequest {
    /// Peer addresses, either URLs or host:port pairs
    pub nodes: Vec<String>,
}

/// Response for the node registration endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterNodesResponse {
    /// The message
    pub message: String,

    /// All peers known after registration
    pub total_nodes: Vec<String>,
}

/// Response for the resolve endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ResolveResponse {
    /// The message
    pub message: String,

    /// Whether the local chain was replaced
    pub replaced: bool,

    /// The local chain after resolution
    pub chain: Vec<Block>,
}

fn bad_request(message: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": message.to_string()
    }))
}

/// Get the full chain
///
/// Returns the entire chain and its length
#[utoipa::path(
    get,
    path = "/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(node: NodeData) -> impl Responder {
    let chain = node.ledger.chain();
    HttpResponse::Ok().json(ChainResponse::new(chain.to_vec()))
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block
#[utoipa::path(
    get,
    path = "/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(node: NodeData) -> impl Responder {
    HttpResponse::Ok().json(node.ledger.pending_transactions())
}

/// Create a new transaction
///
/// Adds a new transaction to the pending buffer
#[utoipa::path(
    post,
    path = "/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = TransactionResponse),
        (status = 400, description = "Missing or invalid transaction fields")
    )
)]
pub async fn new_transaction(
    node: NodeData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let TransactionRequest {
        sender,
        recipient,
        amount,
    } = transaction_req.into_inner();

    let transaction = match Transaction::new(sender, recipient, amount) {
        Ok(transaction) => transaction,
        Err(err) => return bad_request(err),
    };

    let block_index = node.ledger.record_transaction(transaction);

    HttpResponse::Created().json(TransactionResponse {
        message: format!("Transaction will be added to Block {}", block_index),
        block_index,
    })
}

/// Mine a new block
///
/// Searches a proof for the last block, then seals the pending transactions
/// plus the mining reward into a new block
#[utoipa::path(
    get,
    path = "/mine",
    responses(
        (status = 200, description = "Block forged", body = MineResponse),
        (status = 500, description = "Mining failed")
    )
)]
pub async fn mine_block(node: NodeData) -> impl Responder {
    match node.miner.mine().await {
        Ok(block) => HttpResponse::Ok().json(MineResponse {
            message: "New Block Forged".to_string(),
            index: block.index,
            transactions: block.transactions,
            proof: block.proof,
            previous_hash: block.previous_hash,
        }),
        Err(err) => {
            error!("Failed to mine block: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to mine block: {}", err)
            }))
        }
    }
}

/// Register peer nodes
///
/// Addresses are normalized to host:port; known peers are ignored
#[utoipa::path(
    post,
    path = "/nodes/register",
    request_body = RegisterNodesRequest,
    responses(
        (status = 201, description = "Peers registered", body = RegisterNodesResponse),
        (status = 400, description = "Missing node list or malformed address")
    )
)]
pub async fn register_nodes(
    node: NodeData,
    register_req: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    if register_req.nodes.is_empty() {
        return bad_request("Please supply a valid list of nodes");
    }

    match node.peers.register_all(&register_req.nodes) {
        Ok(addresses) => info!("Registered peers {:?}", addresses),
        Err(err) => return bad_request(err),
    }

    HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added".to_string(),
        total_nodes: node.peers.addresses(),
    })
}

/// Resolve conflicts with peers
///
/// Replaces the local chain with the longest valid peer chain, if longer
#[utoipa::path(
    get,
    path = "/nodes/resolve",
    responses(
        (status = 200, description = "Consensus reached", body = ResolveResponse)
    )
)]
pub async fn resolve_conflicts(node: NodeData) -> impl Responder {
    let outcome = node.resolver.resolve_detailed().await;

    let message = if outcome.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };

    HttpResponse::Ok().json(ResolveResponse {
        message: message.to_string(),
        replaced: outcome.replaced,
        chain: outcome.chain.to_vec(),
    })
}

/// Check if the local chain is valid
#[utoipa::path(
    get,
    path = "/validate",
    responses(
        (status = 200, description = "Chain validation status", body = bool)
    )
)]
pub async fn validate_chain(node: NodeData) -> impl Responder {
    HttpResponse::Ok().json(node.validator.is_valid_chain(&node.ledger.chain()))
}
