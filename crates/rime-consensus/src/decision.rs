//! Per-transaction decision lifecycle.

use std::fmt;

/// Opaque comparable identifier for a value to be validated.
///
/// Validity is judged by comparing the raw value against a node's validity
/// threshold; the core imposes no uniqueness constraint beyond identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Create from a raw value.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one (node, transaction) pair.
///
/// Transitions are monotonic: `Unseen → Pending → {Accepted, Rejected}`.
/// Once terminal, a pair never changes again. Each node holds an
/// independent copy of this state; there is no shared global decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionState {
    /// The node has never observed the transaction.
    #[default]
    Unseen,
    /// An engine run is in flight for the transaction.
    Pending,
    /// Finalized as valid; the transaction joined the node's chain.
    Accepted,
    /// Finalized as invalid.
    Rejected,
}

impl DecisionState {
    /// The terminal state for a boolean decision.
    pub const fn from_decision(accepted: bool) -> Self {
        if accepted {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }

    /// Whether this state is `Accepted` or `Rejected`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// The decision carried by a terminal state, `None` otherwise.
    pub const fn decision(&self) -> Option<bool> {
        match self {
            Self::Accepted => Some(true),
            Self::Rejected => Some(false),
            Self::Unseen | Self::Pending => None,
        }
    }

    /// Whether the monotonic lifecycle permits moving to `next`.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unseen, Self::Pending)
                | (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Rejected)
        )
    }
}
