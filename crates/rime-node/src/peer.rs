//! Peer query capability.
//!
//! The engine depends only on the [`PeerClient`] trait, never on a concrete
//! transport. [`HttpPeerClient`] talks to real node servers over HTTP;
//! [`LocalPeerClient`] hands queries to in-process nodes through a shared
//! registry, which is what deterministic tests drive.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rime_consensus::TransactionId;
use rime_topology::NodeAddress;
use tokio::sync::RwLock;

use crate::api::{TxValidationRequest, TxValidationResponse};
use crate::error::{Error, Result};
use crate::node::Node;

/// Capability to ask another node for its current preference.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Query `peer` for its preference on `tx`.
    ///
    /// An error signals transport-level failure only (unreachable peer,
    /// undecodable answer), never a protocol-level rejection. The engine
    /// treats it as an abstention for the round.
    async fn query(&self, peer: NodeAddress, tx: TransactionId) -> Result<bool>;
}

/// Peer client that queries node servers over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    http: reqwest::Client,
    host: String,
}

impl HttpPeerClient {
    /// Client for nodes served on localhost ports.
    pub fn new() -> Self {
        Self::with_host("127.0.0.1")
    }

    /// Client for nodes served on a specific host.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into(),
        }
    }
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn query(&self, peer: NodeAddress, tx: TransactionId) -> Result<bool> {
        let url = format!("http://{}:{}/validate", self.host, peer.value());
        let response = self
            .http
            .post(&url)
            .json(&TxValidationRequest { tx })
            .send()
            .await
            .map_err(|err| Error::PeerUnreachable {
                peer,
                reason: err.to_string(),
            })?;

        let body: TxValidationResponse = response
            .json()
            .await
            .map_err(|_| Error::MalformedResponse { peer })?;
        Ok(body.pref)
    }
}

/// Registry of in-process nodes, shared by [`LocalPeerClient`] instances.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<NodeAddress, Arc<Node>>>,
}

impl NodeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a node reachable under its address.
    pub async fn register(&self, node: Arc<Node>) {
        self.nodes.write().await.insert(node.addr(), node);
    }

    /// Look up a node by address.
    pub async fn get(&self, addr: NodeAddress) -> Option<Arc<Node>> {
        self.nodes.read().await.get(&addr).cloned()
    }
}

/// Peer client that invokes in-process nodes directly.
#[derive(Clone)]
pub struct LocalPeerClient {
    registry: Arc<NodeRegistry>,
}

impl LocalPeerClient {
    /// Client over a shared node registry.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl PeerClient for LocalPeerClient {
    async fn query(&self, peer: NodeAddress, tx: TransactionId) -> Result<bool> {
        match self.registry.get(peer).await {
            Some(node) => Ok(node.handle_query(tx).await),
            None => Err(Error::PeerUnreachable {
                peer,
                reason: "not registered".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_client_reports_unregistered_peers_unreachable() {
        let registry = Arc::new(NodeRegistry::new());
        let client = LocalPeerClient::new(registry);

        let err = client
            .query(NodeAddress::new(9000), TransactionId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PeerUnreachable { .. }));
    }

    #[tokio::test]
    async fn http_client_reports_connection_failures_unreachable() {
        // Nothing listens on this port.
        let client = HttpPeerClient::new();
        let err = client
            .query(NodeAddress::new(1), TransactionId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PeerUnreachable { .. }));
    }
}
