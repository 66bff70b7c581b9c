use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pow_ledger::api::{self, NodeState};
use pow_ledger::blockchain::{self, ProofOfWork};
use pow_ledger::config::NodeConfig;
use pow_ledger::network::{self, HttpPeerClient};

// Build the shared node state and register the configured peers
fn initialize_node(config: &NodeConfig) -> anyhow::Result<NodeState> {
    let client = HttpPeerClient::new(config.peer_timeout())
        .context("failed to build peer HTTP client")?;

    let pow = ProofOfWork::new(config.difficulty);
    let node = NodeState::new(pow, config.node_id(), Arc::new(client));
    info!(
        "Node {} mining at difficulty {}",
        node.miner.node_id(),
        pow.difficulty()
    );

    for peer in &config.peers {
        match node.peers.register(peer) {
            Ok(address) => info!("Registered peer {}", address),
            Err(err) => warn!("Ignoring configured peer: {}", err),
        }
    }

    Ok(node)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::get_pending_transactions,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::register_nodes,
        api::handlers::resolve_conflicts,
        api::handlers::validate_chain
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            network::ChainResponse,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineResponse,
            api::handlers::RegisterNodesRequest,
            api::handlers::RegisterNodesResponse,
            api::handlers::ResolveResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger node API endpoints")
    ),
    info(
        title = "Proof-of-Work Ledger API",
        version = "1.0.0",
        description = "A minimal proof-of-work ledger node",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = NodeConfig::parse();
    let node = web::Data::new(initialize_node(&config)?);

    info!("Starting HTTP server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(node.clone())
            .configure(api::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi())
            )
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
