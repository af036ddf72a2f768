//! Rime Consensus
//!
//! The pure Snowball state machine: repeated randomized polls, quorum
//! tallying, and a consecutive-success threshold that turns a node's
//! revisable preference into a final decision.
//!
//! This crate is deliberately free of I/O and clocks. The engine that
//! samples peers lives in `rime-node`; it feeds each round's [`Tally`] into
//! [`Snowball::record_poll`] and reads back preference and finality. That
//! split lets the algorithm be tested exhaustively with plain unit tests.

mod decision;
mod params;
mod snowball;

pub use decision::{DecisionState, TransactionId};
pub use params::Parameters;
pub use snowball::{Snowball, Tally};

use thiserror::Error;

/// Result type for consensus operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Errors from the consensus state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// The parameter set is internally inconsistent.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A poll was recorded after the instance already finalized.
    #[error("consensus instance already finalized")]
    AlreadyFinalized,
}
