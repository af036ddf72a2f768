//! The Snowball state machine.
//!
//! One instance exists per engine run. Every round the engine polls a
//! random sample of neighbors and feeds the answers it actually received
//! into [`Snowball::record_poll`]; dropped or failed queries simply never
//! reach the tally. Requiring `decision_threshold` *consecutive* quorum
//! wins filters out noise from a single unlucky or adversarial sample, so
//! convergence is a probabilistic property rather than a round-bounded one.

use crate::{ConsensusError, Parameters, Result};

/// Vote counts for a single polling round.
///
/// Only answers actually received are recorded; errored queries are
/// abstentions and do not appear on either side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    true_votes: usize,
    false_votes: usize,
}

impl Tally {
    /// An empty tally.
    pub const fn new() -> Self {
        Self {
            true_votes: 0,
            false_votes: 0,
        }
    }

    /// Record one received answer.
    pub fn record(&mut self, preference: bool) {
        if preference {
            self.true_votes += 1;
        } else {
            self.false_votes += 1;
        }
    }

    /// Votes for `true`.
    pub const fn true_votes(&self) -> usize {
        self.true_votes
    }

    /// Votes for `false`.
    pub const fn false_votes(&self) -> usize {
        self.false_votes
    }

    /// Total answers received this round.
    pub const fn responses(&self) -> usize {
        self.true_votes + self.false_votes
    }

    /// The round's candidate: `true` if it reached quorum, else `false` if
    /// it did, else no candidate.
    pub const fn candidate(&self, quorum_size: usize) -> Option<bool> {
        if self.true_votes >= quorum_size {
            Some(true)
        } else if self.false_votes >= quorum_size {
            Some(false)
        } else {
            None
        }
    }
}

/// Binary Snowball: a revisable preference hardened into a decision by
/// consecutive quorum wins.
#[derive(Debug, Clone)]
pub struct Snowball {
    params: Parameters,
    preference: bool,
    consecutive_successes: u32,
    finalized: bool,
}

impl Snowball {
    /// Create an instance seeded with an initial preference.
    pub fn new(params: Parameters, initial_preference: bool) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            preference: initial_preference,
            consecutive_successes: 0,
            finalized: false,
        })
    }

    /// The parameter set this instance runs with.
    pub const fn params(&self) -> &Parameters {
        &self.params
    }

    /// The current preference. After finalization this is the decision.
    pub const fn preference(&self) -> bool {
        self.preference
    }

    /// Consecutive rounds the current preference has won quorum.
    pub const fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    /// Whether the instance has reached a final decision.
    pub const fn finalized(&self) -> bool {
        self.finalized
    }

    /// The final decision, once reached.
    pub const fn decision(&self) -> Option<bool> {
        if self.finalized {
            Some(self.preference)
        } else {
            None
        }
    }

    /// Fold one round's tally into the state machine.
    ///
    /// A candidate equal to the current preference extends the success
    /// streak; a differing candidate becomes the new preference with a
    /// streak of one; a round without quorum resets the streak to zero.
    /// Returns `true` once the decision threshold is reached.
    pub fn record_poll(&mut self, tally: &Tally) -> Result<bool> {
        if self.finalized {
            return Err(ConsensusError::AlreadyFinalized);
        }

        match tally.candidate(self.params.quorum_size) {
            Some(candidate) if candidate == self.preference => {
                self.consecutive_successes += 1;
            }
            Some(candidate) => {
                self.preference = candidate;
                self.consecutive_successes = 1;
            }
            None => {
                self.consecutive_successes = 0;
            }
        }

        if self.consecutive_successes >= self.params.decision_threshold {
            self.finalized = true;
        }
        Ok(self.finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unanimous(preference: bool, count: usize) -> Tally {
        let mut tally = Tally::new();
        for _ in 0..count {
            tally.record(preference);
        }
        tally
    }

    #[test]
    fn converges_after_exactly_threshold_rounds() {
        let mut sb = Snowball::new(Parameters::new(5, 3, 3), true).expect("valid params");

        for round in 1..=3 {
            let done = sb.record_poll(&unanimous(true, 5)).expect("not finalized");
            assert_eq!(done, round == 3);
        }

        assert!(sb.finalized());
        assert_eq!(sb.decision(), Some(true));
    }

    #[test]
    fn flip_restarts_the_streak_at_one() {
        let mut sb = Snowball::new(Parameters::new(5, 3, 3), true).expect("valid params");

        sb.record_poll(&unanimous(true, 5)).expect("poll");
        sb.record_poll(&unanimous(true, 5)).expect("poll");
        assert_eq!(sb.consecutive_successes(), 2);

        sb.record_poll(&unanimous(false, 5)).expect("poll");
        assert!(!sb.preference());
        assert_eq!(sb.consecutive_successes(), 1);
        assert!(!sb.finalized());
    }

    #[test]
    fn missed_quorum_resets_the_streak_to_zero() {
        let mut sb = Snowball::new(Parameters::new(5, 3, 3), true).expect("valid params");

        sb.record_poll(&unanimous(true, 5)).expect("poll");
        sb.record_poll(&unanimous(true, 5)).expect("poll");
        assert_eq!(sb.consecutive_successes(), 2);

        // 2 vs 2 with one abstention: no side reaches quorum.
        let mut split = Tally::new();
        split.record(true);
        split.record(true);
        split.record(false);
        split.record(false);
        sb.record_poll(&split).expect("poll");

        assert_eq!(sb.consecutive_successes(), 0);
        assert!(sb.preference(), "preference survives a failed round");
    }

    #[test]
    fn abstentions_can_still_yield_a_quorum() {
        let mut sb = Snowball::new(Parameters::new(5, 3, 1), true).expect("valid params");

        // Two of five queries failed; the three answers that arrived agree.
        let done = sb.record_poll(&unanimous(true, 3)).expect("poll");
        assert!(done);
        assert_eq!(sb.decision(), Some(true));
    }

    #[test]
    fn true_wins_when_both_sides_reach_quorum() {
        // With Q ≤ S/2 both sides can hit quorum in one round; the
        // protocol checks the true side first.
        let mut sb = Snowball::new(Parameters::new(5, 2, 1), false).expect("valid params");

        let mut tally = Tally::new();
        tally.record(true);
        tally.record(true);
        tally.record(false);
        tally.record(false);
        tally.record(false);

        sb.record_poll(&tally).expect("poll");
        assert_eq!(sb.decision(), Some(true));
    }

    #[test]
    fn polls_after_finalization_are_rejected() {
        let mut sb = Snowball::new(Parameters::new(5, 3, 1), true).expect("valid params");
        sb.record_poll(&unanimous(true, 5)).expect("poll");
        assert!(sb.finalized());

        assert_eq!(
            sb.record_poll(&unanimous(true, 5)),
            Err(ConsensusError::AlreadyFinalized)
        );
    }

    #[test]
    fn invalid_parameters_rejected_at_construction() {
        assert!(Snowball::new(Parameters::new(5, 6, 3), true).is_err());
    }

    #[test]
    fn empty_tally_has_no_candidate() {
        assert_eq!(Tally::new().candidate(1), None);
    }

    proptest! {
        #[test]
        fn threshold_consecutive_wins_always_finalize(
            threshold in 1u32..10,
            preference: bool,
        ) {
            let params = Parameters::new(5, 3, threshold);
            let mut sb = Snowball::new(params, preference).expect("valid params");

            for _ in 0..threshold {
                prop_assert!(!sb.finalized());
                sb.record_poll(&unanimous(preference, 5)).expect("poll");
            }

            prop_assert!(sb.finalized());
            prop_assert_eq!(sb.decision(), Some(preference));
        }

        #[test]
        fn preference_tracks_the_last_candidate(
            rounds in proptest::collection::vec(any::<Option<bool>>(), 1..32),
        ) {
            let params = Parameters::new(5, 3, u32::MAX);
            let mut sb = Snowball::new(params, true).expect("valid params");
            let mut expected = true;

            for round in rounds {
                let tally = match round {
                    Some(pref) => unanimous(pref, 5),
                    None => Tally::new(),
                };
                sb.record_poll(&tally).expect("poll");
                if let Some(pref) = round {
                    expected = pref;
                }
                prop_assert_eq!(sb.preference(), expected);
            }
        }
    }
}
