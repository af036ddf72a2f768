//! Rime Node - Snowball Consensus Simulation
//!
//! A network of peer nodes that independently converge on the validity of
//! proposed transactions through repeated randomized sampling, despite a
//! minority of peers judging validity by a looser (malicious) rule.
//!
//! # Architecture
//!
//! - **Store**: per-node decision state machine and append-only chain
//! - **Engine**: one Snowball sampling task per (node, transaction)
//! - **Peer clients**: the query capability, over HTTP or in-process
//! - **API**: per-node HTTP endpoints for peers and local callers
//! - **Gateway**: public entry point forwarding into the network
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rime_node::{build_network, serve_network, Gateway, HttpPeerClient, SimulationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SimulationConfig::from_env();
//!     let network = build_network(&config, Arc::new(HttpPeerClient::new())).await?;
//!     serve_network(&network);
//!     Gateway::new(network.addresses(), config.gateway_port).serve().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
mod engine;
pub mod error;
pub mod gateway;
pub mod network;
pub mod node;
pub mod peer;
pub mod store;

pub use config::SimulationConfig;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use network::{build_local_network, build_network, serve_network, Network};
pub use node::Node;
pub use peer::{HttpPeerClient, LocalPeerClient, NodeRegistry, PeerClient};
pub use store::{DecisionStore, Observed};

pub use rime_consensus::{DecisionState, Parameters, TransactionId};
pub use rime_topology::NodeAddress;
