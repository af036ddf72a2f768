//! Network bootstrap.
//!
//! Builds the random peer topology, assigns validity thresholds (a
//! designated minority runs the loosened, malicious rule), constructs
//! every node, and optionally serves each node's HTTP API.

use std::sync::Arc;

use rime_topology::{NodeAddress, TopologyBuilder};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::node::Node;
use crate::peer::{LocalPeerClient, NodeRegistry, PeerClient};

/// A fully constructed network of nodes.
pub struct Network {
    nodes: Vec<Arc<Node>>,
}

impl Network {
    /// All nodes in address order.
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// All node addresses in order.
    pub fn addresses(&self) -> Vec<NodeAddress> {
        self.nodes.iter().map(|node| node.addr()).collect()
    }

    /// Look up a node by address.
    pub fn node(&self, addr: NodeAddress) -> Option<&Arc<Node>> {
        self.nodes.iter().find(|node| node.addr() == addr)
    }

    /// Cancel every in-flight engine run on every node.
    pub fn shutdown(&self) {
        for node in &self.nodes {
            node.shutdown();
        }
    }
}

/// Whether the node at `index` runs the loosened validity rule.
fn is_malicious(index: usize, stride: usize) -> bool {
    stride != 0 && index > 0 && index % stride == 0
}

/// Build all nodes over a fresh random topology.
///
/// The caller supplies the peer transport; nodes are not served yet (see
/// [`serve_network`]).
pub async fn build_network(
    config: &SimulationConfig,
    client: Arc<dyn PeerClient>,
) -> Result<Network> {
    config.validate()?;

    let topology = TopologyBuilder::new(config.nodes, config.min_neighbors)
        .first_address(NodeAddress::new(config.base_port))
        .build()?;

    let params = config.parameters();
    let mut nodes = Vec::with_capacity(config.nodes);
    for (index, (addr, neighbors)) in topology.iter().enumerate() {
        let validity_threshold = if is_malicious(index, config.malicious_stride) {
            config.malicious_threshold
        } else {
            config.canonical_threshold
        };
        let node = Node::new(
            addr,
            neighbors.to_vec(),
            validity_threshold,
            params,
            Arc::clone(&client),
        )
        .await?;
        nodes.push(node);
    }

    tracing::info!(nodes = nodes.len(), "network built");
    Ok(Network { nodes })
}

/// Build an in-process network wired through a shared registry (no sockets).
pub async fn build_local_network(
    config: &SimulationConfig,
) -> Result<(Network, Arc<NodeRegistry>)> {
    let registry = Arc::new(NodeRegistry::new());
    let client = Arc::new(LocalPeerClient::new(Arc::clone(&registry)));
    let network = build_network(config, client).await?;
    for node in network.nodes() {
        registry.register(Arc::clone(node)).await;
    }
    Ok((network, registry))
}

/// Serve every node's HTTP API in background tasks.
pub fn serve_network(network: &Network) {
    for node in network.nodes() {
        let node = Arc::clone(node);
        tokio::spawn(async move {
            let addr = node.addr();
            if let Err(err) = node.serve().await {
                tracing::error!(node = %addr, %err, "node server exited");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SimulationConfig {
        SimulationConfig {
            nodes: 10,
            min_neighbors: 4,
            base_port: 9000,
            gateway_port: 3000,
            sample_size: 3,
            quorum_size: 2,
            decision_threshold: 3,
            max_rounds: None,
            canonical_threshold: 100,
            malicious_threshold: 20,
            malicious_stride: 5,
        }
    }

    #[test]
    fn every_fifth_node_is_malicious_except_the_first() {
        assert!(!is_malicious(0, 5));
        assert!(!is_malicious(4, 5));
        assert!(is_malicious(5, 5));
        assert!(!is_malicious(6, 5));
        assert!(is_malicious(10, 5));
    }

    #[test]
    fn zero_stride_disables_the_malicious_minority() {
        for index in 0..100 {
            assert!(!is_malicious(index, 0));
        }
    }

    #[tokio::test]
    async fn build_assigns_thresholds_by_stride() {
        let (network, _registry) = build_local_network(&small()).await.expect("valid config");

        assert_eq!(network.nodes().len(), 10);
        for (index, node) in network.nodes().iter().enumerate() {
            let expected = if is_malicious(index, 5) { 20 } else { 100 };
            assert_eq!(node.validity_threshold(), expected, "node {index}");
        }
    }

    #[tokio::test]
    async fn build_rejects_invalid_configuration() {
        let config = SimulationConfig {
            min_neighbors: 10,
            ..small()
        };
        assert!(build_local_network(&config).await.is_err());
    }

    #[tokio::test]
    async fn nodes_are_reachable_through_the_registry() {
        let (network, registry) = build_local_network(&small()).await.expect("valid config");

        for node in network.nodes() {
            let found = registry.get(node.addr()).await.expect("registered");
            assert_eq!(found.addr(), node.addr());
        }
    }
}
