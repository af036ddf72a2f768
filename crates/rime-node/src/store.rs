//! Per-node decision store.
//!
//! Owns the transaction → decision-state map and the local chain for one
//! node. Reads go straight to the shared maps and never block each other;
//! terminal transitions flow through an update channel drained by a single
//! consumer task, so every write for a node is serialized. The
//! Unseen → Pending transition happens under the map's write lock, which
//! makes it an atomic compare-and-set: at most one caller ever sees
//! [`Observed::NewlyPending`] for a given transaction.

use std::collections::HashMap;
use std::sync::Arc;

use rime_consensus::{DecisionState, TransactionId};
use tokio::sync::{mpsc, RwLock};

/// What `observe` found (and possibly did) for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    /// This call performed the Unseen → Pending transition; the caller is
    /// responsible for starting the one engine run for the transaction.
    NewlyPending,
    /// An engine run is already in flight.
    AlreadyPending,
    /// The decision is final.
    Decided(bool),
}

#[derive(Debug, Default)]
struct Inner {
    decisions: RwLock<HashMap<TransactionId, DecisionState>>,
    chain: RwLock<Vec<TransactionId>>,
}

#[derive(Debug, Clone, Copy)]
struct DecisionUpdate {
    tx: TransactionId,
    accepted: bool,
}

/// Handle to one node's decision state and chain.
///
/// Cheap to clone; all clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct DecisionStore {
    inner: Arc<Inner>,
    updates: mpsc::Sender<DecisionUpdate>,
}

impl DecisionStore {
    /// Create the store and spawn its decision-consumption task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let inner = Arc::new(Inner::default());
        let (updates, rx) = mpsc::channel(64);
        tokio::spawn(drain_updates(Arc::clone(&inner), rx));
        Self { inner, updates }
    }

    /// Current state of a transaction; `Unseen` if never observed.
    pub async fn state(&self, tx: TransactionId) -> DecisionState {
        self.inner
            .decisions
            .read()
            .await
            .get(&tx)
            .copied()
            .unwrap_or_default()
    }

    /// The final decision, once the transaction is terminal.
    pub async fn decision(&self, tx: TransactionId) -> Option<bool> {
        self.state(tx).await.decision()
    }

    /// Look up a transaction, transitioning it Unseen → Pending when this
    /// is its first observation.
    pub async fn observe(&self, tx: TransactionId) -> Observed {
        let mut decisions = self.inner.decisions.write().await;
        match decisions.get(&tx).copied().unwrap_or_default() {
            DecisionState::Unseen => {
                decisions.insert(tx, DecisionState::Pending);
                Observed::NewlyPending
            }
            DecisionState::Pending => Observed::AlreadyPending,
            DecisionState::Accepted => Observed::Decided(true),
            DecisionState::Rejected => Observed::Decided(false),
        }
    }

    /// Snapshot of the local chain in acceptance order.
    pub async fn chain(&self) -> Vec<TransactionId> {
        self.inner.chain.read().await.clone()
    }

    /// Hand an engine run's outcome to the decision-consumption task.
    pub async fn record_decision(&self, tx: TransactionId, accepted: bool) {
        if self
            .updates
            .send(DecisionUpdate { tx, accepted })
            .await
            .is_err()
        {
            tracing::error!(%tx, "decision consumer gone, decision dropped");
        }
    }
}

async fn drain_updates(inner: Arc<Inner>, mut updates: mpsc::Receiver<DecisionUpdate>) {
    while let Some(DecisionUpdate { tx, accepted }) = updates.recv().await {
        let mut decisions = inner.decisions.write().await;
        let current = decisions.get(&tx).copied().unwrap_or_default();
        let next = DecisionState::from_decision(accepted);

        if current == next {
            // Duplicate record with the same outcome is a no-op.
            continue;
        }
        if !current.can_transition_to(next) {
            tracing::error!(%tx, ?current, ?next, "refusing non-monotonic decision transition");
            continue;
        }

        decisions.insert(tx, next);
        if accepted {
            inner.chain.write().await.push(tx);
        }
        tracing::debug!(%tx, accepted, "decision recorded");
    }
}
