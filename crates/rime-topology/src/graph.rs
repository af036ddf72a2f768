//! Peer graph construction.
//!
//! Nodes are processed in address order. Each node draws uniformly random
//! peers until it reaches the minimum neighbor count, counting edges already
//! inserted toward it by earlier nodes; every edge is inserted symmetrically.
//! A final top-up sweep guarantees the minimum-degree invariant exactly, so
//! no node is ever left under-provisioned.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use thiserror::Error;

use crate::NodeAddress;

/// Errors from topology construction and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The minimum neighbor count is not satisfiable for this network size.
    #[error("network of {size} nodes cannot give every node {min_neighbors} neighbors")]
    NotEnoughNodes { size: usize, min_neighbors: usize },

    /// The contiguous address range starting at `first_address` does not
    /// fit `size` nodes.
    #[error("{size} nodes starting at {first_address} exceed the address space")]
    AddressSpaceExhausted {
        size: usize,
        first_address: NodeAddress,
    },

    /// A node ended up below the minimum neighbor count.
    #[error("node {node} has {degree} neighbors, minimum is {min_neighbors}")]
    UnderProvisioned {
        node: NodeAddress,
        degree: usize,
        min_neighbors: usize,
    },

    /// An edge exists in one direction only.
    #[error("edge {from} -> {to} is not mutual")]
    AsymmetricEdge { from: NodeAddress, to: NodeAddress },

    /// A node is listed as its own neighbor.
    #[error("node {0} has a self-edge")]
    SelfEdge(NodeAddress),

    /// A sample was requested that is larger than the available peer set.
    #[error("cannot sample {requested} peers from {available}")]
    SampleTooLarge { requested: usize, available: usize },
}

/// Symmetric adjacency mapping from node address to its neighbor addresses.
///
/// Built once at startup and immutable afterwards. Neighbor lists are sorted
/// and duplicate-free.
#[derive(Debug, Clone)]
pub struct Topology {
    neighbors: BTreeMap<NodeAddress, Vec<NodeAddress>>,
}

impl Topology {
    /// Number of nodes in the topology.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether the topology has no nodes.
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// All node addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = NodeAddress> + '_ {
        self.neighbors.keys().copied()
    }

    /// The neighbor set of a node, or `None` for an unknown address.
    pub fn neighbors_of(&self, addr: NodeAddress) -> Option<&[NodeAddress]> {
        self.neighbors.get(&addr).map(Vec::as_slice)
    }

    /// Iterate `(node, neighbors)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeAddress, &[NodeAddress])> {
        self.neighbors.iter().map(|(&addr, ns)| (addr, ns.as_slice()))
    }

    /// Whether an edge exists between two nodes.
    pub fn contains_edge(&self, a: NodeAddress, b: NodeAddress) -> bool {
        self.neighbors
            .get(&a)
            .is_some_and(|ns| ns.binary_search(&b).is_ok())
    }

    /// The smallest neighbor count over all nodes.
    pub fn min_degree(&self) -> usize {
        self.neighbors
            .values()
            .map(Vec::len)
            .min()
            .unwrap_or_default()
    }

    /// Check every graph invariant: minimum degree, no self-edges, symmetry.
    pub fn validate(&self, min_neighbors: usize) -> Result<(), TopologyError> {
        for (&node, neighbors) in &self.neighbors {
            if neighbors.len() < min_neighbors {
                return Err(TopologyError::UnderProvisioned {
                    node,
                    degree: neighbors.len(),
                    min_neighbors,
                });
            }
            for &peer in neighbors {
                if peer == node {
                    return Err(TopologyError::SelfEdge(node));
                }
                if !self.contains_edge(peer, node) {
                    return Err(TopologyError::AsymmetricEdge {
                        from: node,
                        to: peer,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builds a random [`Topology`] over a contiguous address range.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    size: usize,
    min_neighbors: usize,
    first_address: NodeAddress,
}

impl TopologyBuilder {
    /// Configure a builder for `size` nodes with at least `min_neighbors`
    /// neighbors each.
    pub fn new(size: usize, min_neighbors: usize) -> Self {
        Self {
            size,
            min_neighbors,
            first_address: NodeAddress::new(0),
        }
    }

    /// Address assigned to the first node; the rest follow contiguously.
    pub fn first_address(mut self, addr: NodeAddress) -> Self {
        self.first_address = addr;
        self
    }

    /// Build with a caller-supplied RNG (deterministic under a seeded RNG).
    pub fn build_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Topology, TopologyError> {
        if self.min_neighbors >= self.size {
            return Err(TopologyError::NotEnoughNodes {
                size: self.size,
                min_neighbors: self.min_neighbors,
            });
        }
        let last_fits = u16::try_from(self.size - 1)
            .ok()
            .and_then(|span| self.first_address.value().checked_add(span))
            .is_some();
        if !last_fits {
            return Err(TopologyError::AddressSpaceExhausted {
                size: self.size,
                first_address: self.first_address,
            });
        }

        let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); self.size];

        for i in 0..self.size {
            self.fill_to_minimum(rng, &mut adjacency, i);
        }
        // Top up any node the forward sweep left below the minimum.
        for i in 0..self.size {
            self.fill_to_minimum(rng, &mut adjacency, i);
        }

        let base = self.first_address.value();
        let neighbors = adjacency
            .into_iter()
            .enumerate()
            .map(|(i, peers)| {
                let mut peers: Vec<NodeAddress> = peers
                    .into_iter()
                    .map(|p| NodeAddress::new(base + p as u16))
                    .collect();
                peers.sort_unstable();
                (NodeAddress::new(base + i as u16), peers)
            })
            .collect();

        Ok(Topology { neighbors })
    }

    /// Build using the thread-local RNG.
    pub fn build(&self) -> Result<Topology, TopologyError> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    fn fill_to_minimum<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        adjacency: &mut [HashSet<usize>],
        node: usize,
    ) {
        let needed = self.min_neighbors.saturating_sub(adjacency[node].len());
        for _ in 0..needed {
            // Uniform draw, retrying on self-selection and duplicates.
            let mut candidate = rng.gen_range(0..self.size);
            while candidate == node || adjacency[node].contains(&candidate) {
                candidate = rng.gen_range(0..self.size);
            }
            adjacency[node].insert(candidate);
            adjacency[candidate].insert(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(size: usize, min_neighbors: usize, seed: u64) -> Topology {
        TopologyBuilder::new(size, min_neighbors)
            .first_address(NodeAddress::new(9000))
            .build_with_rng(&mut StdRng::seed_from_u64(seed))
            .expect("valid parameters")
    }

    #[test]
    fn every_node_reaches_minimum_degree() {
        let topology = build(10, 4, 1);
        assert_eq!(topology.len(), 10);
        assert!(topology.min_degree() >= 4);
    }

    #[test]
    fn invariants_hold_for_built_graph() {
        let topology = build(50, 6, 2);
        topology.validate(6).expect("graph invariants");
    }

    #[test]
    fn edges_are_symmetric() {
        let topology = build(20, 3, 3);
        for node in topology.addresses() {
            for &peer in topology.neighbors_of(node).expect("known node") {
                assert!(topology.contains_edge(peer, node), "{peer} -> {node} missing");
            }
        }
    }

    #[test]
    fn no_self_edges() {
        let topology = build(20, 3, 4);
        for node in topology.addresses() {
            assert!(!topology.contains_edge(node, node));
        }
    }

    #[test]
    fn addresses_are_contiguous_from_first() {
        let topology = build(5, 2, 5);
        let addrs: Vec<_> = topology.addresses().collect();
        assert_eq!(
            addrs,
            (9000..9005).map(NodeAddress::new).collect::<Vec<_>>()
        );
    }

    #[test]
    fn rejects_min_neighbors_equal_to_size() {
        let err = TopologyBuilder::new(5, 5)
            .build_with_rng(&mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            TopologyError::NotEnoughNodes {
                size: 5,
                min_neighbors: 5
            }
        );
    }

    #[test]
    fn rejects_address_range_overflow() {
        let err = TopologyBuilder::new(10, 2)
            .first_address(NodeAddress::new(65_530))
            .build_with_rng(&mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, TopologyError::AddressSpaceExhausted { .. }));
    }

    #[test]
    fn rejects_empty_network() {
        assert!(TopologyBuilder::new(0, 0)
            .build_with_rng(&mut StdRng::seed_from_u64(0))
            .is_err());
    }

    #[test]
    fn validate_catches_asymmetry() {
        let mut topology = build(4, 2, 6);
        let first = topology.addresses().next().expect("nonempty");
        // Break symmetry by hand.
        let peer = topology.neighbors_of(first).expect("known")[0];
        topology
            .neighbors
            .get_mut(&peer)
            .expect("known")
            .retain(|&n| n != first);
        assert!(matches!(
            topology.validate(0),
            Err(TopologyError::AsymmetricEdge { .. })
        ));
    }

    proptest! {
        #[test]
        fn built_graphs_always_satisfy_invariants(
            size in 2usize..64,
            min_ratio in 0.0f64..1.0,
            seed in 0u64..1000,
        ) {
            let min_neighbors = ((size - 1) as f64 * min_ratio) as usize;
            let topology = TopologyBuilder::new(size, min_neighbors)
                .build_with_rng(&mut StdRng::seed_from_u64(seed))
                .expect("min_neighbors < size by construction");
            prop_assert!(topology.validate(min_neighbors).is_ok());
        }
    }
}
