use std::time::Duration;

use clap::Parser;
use uuid::Uuid;

use crate::blockchain::proof::DEFAULT_DIFFICULTY;
use crate::network::client::DEFAULT_PEER_TIMEOUT;

/// Node configuration, read from the command line or `LEDGER_*` variables
#[derive(Debug, Clone, Parser)]
#[command(name = "pow_ledger", version, about = "Proof-of-work ledger node")]
pub struct NodeConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LEDGER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Leading hex zeros required in a proof hash
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY)]
    pub difficulty: usize,

    /// Seconds to wait for a peer before skipping it
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_SECS", default_value_t = DEFAULT_PEER_TIMEOUT.as_secs())]
    pub peer_timeout_secs: u64,

    /// Identifier credited with mining rewards (random when omitted)
    #[arg(long, env = "LEDGER_NODE_ID")]
    pub node_id: Option<String>,

    /// Peers to register at startup, may be repeated
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,
}

impl NodeConfig {
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_timeout_secs)
    }

    /// Configured node id, or a fresh dash-less UUID
    pub fn node_id(&self) -> String {
        self.node_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
    }
}
