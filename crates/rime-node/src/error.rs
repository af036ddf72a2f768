//! Error types for the node runtime.

use rime_consensus::ConsensusError;
use rime_topology::{NodeAddress, TopologyError};
use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the node runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// The simulation configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A node's neighbor set cannot support the configured sample size.
    #[error("node {node} has {degree} neighbors but the sample size is {sample_size}")]
    InsufficientNeighbors {
        node: NodeAddress,
        degree: usize,
        sample_size: usize,
    },

    /// Transport-level failure while querying a peer.
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: NodeAddress, reason: String },

    /// A peer's answer could not be decoded.
    #[error("malformed response from peer {peer}")]
    MalformedResponse { peer: NodeAddress },

    /// Topology construction or sampling error.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// Consensus parameter or state machine error.
    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
