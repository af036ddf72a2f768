//! Rime Peer Topology
//!
//! Random peer graph construction with a minimum-degree invariant, plus the
//! without-replacement neighbor sampling used by the consensus engine.
//!
//! # Graph Invariants
//!
//! A built [`Topology`] satisfies, for every node:
//! - at least `min_neighbors` distinct neighbors (nodes may have more),
//! - no self-edges,
//! - symmetric membership: `j ∈ neighbors(i) ⇔ i ∈ neighbors(j)`.
//!
//! Construction is rejected up front when the parameters make the invariant
//! unsatisfiable (`min_neighbors ≥ size`); it never partially fails.

mod graph;
mod sample;

pub use graph::{Topology, TopologyBuilder, TopologyError};
pub use sample::sample_peers;

use std::fmt;

/// Opaque unique identifier for a node.
///
/// Doubles as the node's TCP port in the networked simulation, which is why
/// it is a `u16`. Assigned at topology construction, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeAddress(pub u16);

impl NodeAddress {
    /// Create from a raw address value.
    #[inline]
    pub const fn new(addr: u16) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
