//! Snowball parameters.

use crate::{ConsensusError, Result};

/// The fixed parameter set driving one Snowball instance.
///
/// - `sample_size` (S): distinct neighbors polled per round.
/// - `quorum_size` (Q): identical answers within one round needed to treat
///   that answer as the round's candidate. Must satisfy `1 ≤ Q ≤ S`.
/// - `decision_threshold` (D): consecutive rounds the same candidate must
///   win quorum before the decision is final.
/// - `max_rounds`: optional cap on rounds; `None` (the default) lets a run
///   poll until it converges. A capped run that exhausts the budget aborts
///   without deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    pub sample_size: usize,
    pub quorum_size: usize,
    pub decision_threshold: u32,
    pub max_rounds: Option<u64>,
}

impl Parameters {
    /// Create a parameter set with no round cap.
    pub const fn new(sample_size: usize, quorum_size: usize, decision_threshold: u32) -> Self {
        Self {
            sample_size,
            quorum_size,
            decision_threshold,
            max_rounds: None,
        }
    }

    /// Cap the number of rounds a run may take.
    pub const fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(ConsensusError::InvalidParameters(
                "sample size must be at least 1".into(),
            ));
        }
        if self.quorum_size == 0 || self.quorum_size > self.sample_size {
            return Err(ConsensusError::InvalidParameters(format!(
                "quorum size {} must be between 1 and sample size {}",
                self.quorum_size, self.sample_size
            )));
        }
        if self.decision_threshold == 0 {
            return Err(ConsensusError::InvalidParameters(
                "decision threshold must be at least 1".into(),
            ));
        }
        if self.max_rounds == Some(0) {
            return Err(ConsensusError::InvalidParameters(
                "round cap must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}
