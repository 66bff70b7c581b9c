use dashmap::DashSet;
use reqwest::Url;
use thiserror::Error;

/// Errors that can occur while registering or talking to peers
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Malformed peer address: {0}")]
    MalformedAddress(String),

    #[error("Peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("Peer {peer} sent an invalid response: {reason}")]
    InvalidResponse { peer: String, reason: String },
}

/// Normalizes a raw peer address to a bare `host[:port]`
///
/// Accepts full URLs (`http://10.0.0.2:5000/chain`) as well as bare
/// `host:port` pairs. Scheme, path and query are dropped. A port written
/// in the input is always kept, even when it is the scheme's default.
pub fn normalize_address(raw: &str) -> Result<String, PeerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PeerError::MalformedAddress(raw.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| PeerError::MalformedAddress(format!("{}: {}", raw, e)))?;

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| PeerError::MalformedAddress(raw.to_string()))?;

    // Url drops default ports, so look for one in the raw authority
    let port = if names_port(&with_scheme) {
        url.port_or_known_default()
    } else {
        url.port()
    };

    Ok(match port {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn names_port(with_scheme: &str) -> bool {
    let authority = with_scheme
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(with_scheme)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    let host_port = authority.rsplit('@').next().unwrap_or_default();

    // The part after the last ':' of an IPv6 literal still holds a ']'
    host_port
        .rsplit_once(':')
        .map(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Set of known peer addresses
#[derive(Debug, Default)]
pub struct PeerSet {
    nodes: DashSet<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer, returning its normalized address
    ///
    /// Registering the same peer twice is a no-op.
    pub fn register(&self, raw: &str) -> Result<String, PeerError> {
        let address = normalize_address(raw)?;
        self.nodes.insert(address.clone());

        Ok(address)
    }

    /// Registers several peers, all or nothing
    ///
    /// Every address is normalized before any is inserted, so one malformed
    /// entry leaves the set untouched.
    pub fn register_all<S: AsRef<str>>(&self, raws: &[S]) -> Result<Vec<String>, PeerError> {
        let addresses = raws
            .iter()
            .map(|raw| normalize_address(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        for address in &addresses {
            self.nodes.insert(address.clone());
        }

        Ok(addresses)
    }

    /// Gets all registered peers, sorted
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.nodes.iter().map(|node| node.key().clone()).collect();
        addresses.sort();
        addresses
    }

    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains(address)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
