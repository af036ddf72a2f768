//! The Snowball engine run.
//!
//! One [`ValidationRun`] exists per (node, transaction), spawned by the
//! node when a transaction first turns Pending. Each round it samples
//! distinct neighbors, fans the queries out concurrently, joins on every
//! outcome, and feeds the answers that actually arrived into the Snowball
//! machine. Transport noise never aborts a run; the only exits are a final
//! decision, shutdown, or an exhausted round cap, and only the first one
//! records anything.

use std::sync::Arc;

use futures::future::join_all;
use rime_consensus::{Snowball, Tally, TransactionId};
use rime_topology::{sample_peers, NodeAddress};
use tokio::sync::watch;

use crate::peer::PeerClient;
use crate::store::DecisionStore;

pub(crate) struct ValidationRun {
    node: NodeAddress,
    tx: TransactionId,
    snowball: Snowball,
    neighbors: Arc<Vec<NodeAddress>>,
    client: Arc<dyn PeerClient>,
    store: DecisionStore,
    preference: watch::Sender<bool>,
    shutdown: watch::Receiver<bool>,
}

impl ValidationRun {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        node: NodeAddress,
        tx: TransactionId,
        snowball: Snowball,
        neighbors: Arc<Vec<NodeAddress>>,
        client: Arc<dyn PeerClient>,
        store: DecisionStore,
        preference: watch::Sender<bool>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            node,
            tx,
            snowball,
            neighbors,
            client,
            store,
            preference,
            shutdown,
        }
    }

    /// Drive the transaction to a decision.
    pub(crate) async fn run(mut self) {
        let mut rounds: u64 = 0;

        loop {
            if *self.shutdown.borrow() {
                tracing::debug!(node = %self.node, tx = %self.tx, "engine run cancelled");
                return;
            }
            if let Some(cap) = self.snowball.params().max_rounds {
                if rounds >= cap {
                    tracing::warn!(
                        node = %self.node,
                        tx = %self.tx,
                        rounds,
                        "round cap exhausted without convergence"
                    );
                    return;
                }
            }
            rounds += 1;

            let sample_size = self.snowball.params().sample_size;
            let sample = {
                let mut rng = rand::thread_rng();
                match sample_peers(&mut rng, self.node, &self.neighbors, sample_size) {
                    Ok(sample) => sample,
                    Err(err) => {
                        tracing::error!(node = %self.node, tx = %self.tx, %err, "sampling failed, aborting run");
                        return;
                    }
                }
            };

            let answers = join_all(
                sample
                    .iter()
                    .map(|&peer| self.client.query(peer, self.tx)),
            )
            .await;

            let mut tally = Tally::new();
            for answer in answers {
                match answer {
                    Ok(pref) => tally.record(pref),
                    // Failed queries abstain from this round's tally.
                    Err(err) => {
                        tracing::trace!(node = %self.node, tx = %self.tx, %err, "peer query dropped")
                    }
                }
            }

            let finalized = match self.snowball.record_poll(&tally) {
                Ok(finalized) => finalized,
                Err(err) => {
                    tracing::error!(node = %self.node, tx = %self.tx, %err, "poll rejected, aborting run");
                    return;
                }
            };
            let _ = self.preference.send(self.snowball.preference());

            if finalized {
                let decision = self.snowball.preference();
                tracing::info!(
                    node = %self.node,
                    tx = %self.tx,
                    decision,
                    rounds,
                    "transaction decided"
                );
                self.store.record_decision(self.tx, decision).await;
                return;
            }
        }
    }
}
