//! Simulation configuration.
//!
//! One immutable value constructed at startup and passed into the topology
//! builder and node constructors; there is no ambient global configuration.

use std::fmt::Debug;
use std::str::FromStr;

use rime_consensus::Parameters;

use crate::error::{Error, Result};

/// Configuration for a full simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of nodes in the network.
    pub nodes: usize,

    /// Minimum neighbor count per node (K).
    pub min_neighbors: usize,

    /// Address (and TCP port) of the first node; the rest follow.
    pub base_port: u16,

    /// Port of the public gateway.
    pub gateway_port: u16,

    /// Neighbors sampled per round (S).
    pub sample_size: usize,

    /// Identical answers within a round needed for a candidate (Q).
    pub quorum_size: usize,

    /// Consecutive quorum wins needed to finalize (D).
    pub decision_threshold: u32,

    /// Optional cap on engine rounds; unbounded when `None`.
    pub max_rounds: Option<u64>,

    /// Validity threshold of canonical nodes.
    pub canonical_threshold: u64,

    /// Validity threshold of the malicious minority.
    pub malicious_threshold: u64,

    /// Every n-th node runs the malicious threshold; 0 disables the
    /// malicious minority entirely.
    pub malicious_stride: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SimulationConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            nodes: parse_var("RIME_NODES", 20),
            min_neighbors: parse_var("RIME_MIN_NEIGHBORS", 6),
            base_port: parse_var("RIME_BASE_PORT", 9000),
            gateway_port: parse_var("RIME_GATEWAY_PORT", 3000),
            sample_size: parse_var("RIME_SAMPLE_SIZE", 5),
            quorum_size: parse_var("RIME_QUORUM_SIZE", 3),
            decision_threshold: parse_var("RIME_DECISION_THRESHOLD", 3),
            max_rounds: std::env::var("RIME_MAX_ROUNDS")
                .ok()
                .map(|v| v.parse().expect("invalid RIME_MAX_ROUNDS")),
            canonical_threshold: parse_var("RIME_CANONICAL_THRESHOLD", 100),
            malicious_threshold: parse_var("RIME_MALICIOUS_THRESHOLD", 20),
            malicious_stride: parse_var("RIME_MALICIOUS_STRIDE", 5),
        }
    }

    /// The Snowball parameter set shared by every node.
    pub fn parameters(&self) -> Parameters {
        let params = Parameters::new(self.sample_size, self.quorum_size, self.decision_threshold);
        match self.max_rounds {
            Some(cap) => params.with_max_rounds(cap),
            None => params,
        }
    }

    /// Reject inconsistent configurations before any construction happens.
    pub fn validate(&self) -> Result<()> {
        if self.nodes == 0 {
            return Err(Error::InvalidConfiguration("network size is zero".into()));
        }
        if self.min_neighbors >= self.nodes {
            return Err(Error::InvalidConfiguration(format!(
                "minimum neighbor count {} must be smaller than network size {}",
                self.min_neighbors, self.nodes
            )));
        }
        if self.sample_size > self.min_neighbors {
            return Err(Error::InvalidConfiguration(format!(
                "sample size {} exceeds the guaranteed neighbor count {}",
                self.sample_size, self.min_neighbors
            )));
        }
        self.parameters().validate()?;

        let ports_needed = u16::try_from(self.nodes)
            .ok()
            .and_then(|n| self.base_port.checked_add(n))
            .is_some();
        if !ports_needed {
            return Err(Error::InvalidConfiguration(format!(
                "{} nodes starting at port {} exceed the port range",
                self.nodes, self.base_port
            )));
        }
        let node_ports = self.base_port..self.base_port + self.nodes as u16;
        if node_ports.contains(&self.gateway_port) {
            return Err(Error::InvalidConfiguration(format!(
                "gateway port {} collides with the node port range",
                self.gateway_port
            )));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|err| panic!("invalid {key}: {err:?}")),
        Err(_) => default,
    }
}
