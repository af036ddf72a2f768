//! A single peer node.
//!
//! Owns the decision store, answers validation queries from local callers
//! and remote peers, and spawns one engine run per newly observed
//! transaction. Queries never block on convergence: the synchronous answer
//! is the node's live best-known preference, while the authoritative
//! decision lands in the store later.

use std::collections::HashMap;
use std::sync::Arc;

use rime_consensus::{Parameters, Snowball, TransactionId};
use rime_topology::NodeAddress;
use tokio::sync::{watch, RwLock};

use crate::api;
use crate::engine::ValidationRun;
use crate::error::{Error, Result};
use crate::peer::PeerClient;
use crate::store::{DecisionStore, Observed};

/// A peer node instance.
pub struct Node {
    addr: NodeAddress,
    neighbors: Arc<Vec<NodeAddress>>,
    validity_threshold: u64,
    params: Parameters,
    store: DecisionStore,
    client: Arc<dyn PeerClient>,
    live_preferences: RwLock<HashMap<TransactionId, watch::Receiver<bool>>>,
    shutdown: watch::Sender<bool>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("addr", &self.addr)
            .field("neighbors", &self.neighbors)
            .field("validity_threshold", &self.validity_threshold)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Create a node.
    ///
    /// Fails fast when the parameters are inconsistent or the neighbor set
    /// cannot support the configured sample size; neither is checked again
    /// at request time.
    pub async fn new(
        addr: NodeAddress,
        neighbors: Vec<NodeAddress>,
        validity_threshold: u64,
        params: Parameters,
        client: Arc<dyn PeerClient>,
    ) -> Result<Arc<Self>> {
        params.validate().map_err(Error::Consensus)?;
        if neighbors.len() < params.sample_size {
            return Err(Error::InsufficientNeighbors {
                node: addr,
                degree: neighbors.len(),
                sample_size: params.sample_size,
            });
        }

        let (shutdown, _) = watch::channel(false);
        Ok(Arc::new(Self {
            addr,
            neighbors: Arc::new(neighbors),
            validity_threshold,
            params,
            store: DecisionStore::new(),
            client,
            live_preferences: RwLock::new(HashMap::new()),
            shutdown,
        }))
    }

    /// This node's address.
    pub fn addr(&self) -> NodeAddress {
        self.addr
    }

    /// This node's neighbor set.
    pub fn neighbors(&self) -> &[NodeAddress] {
        &self.neighbors
    }

    /// The validity threshold this node judges fresh transactions by.
    pub fn validity_threshold(&self) -> u64 {
        self.validity_threshold
    }

    /// A fresh transaction's preference under this node's validity rule.
    pub fn initial_preference(&self, tx: TransactionId) -> bool {
        tx.value() >= self.validity_threshold
    }

    /// Answer a validation query from a local caller or a sampling peer.
    ///
    /// Decided transactions answer with their decision; a first encounter
    /// seeds and starts the one engine run for the transaction and answers
    /// with the seed; a transaction already in flight answers with the
    /// run's current preference.
    pub async fn handle_query(&self, tx: TransactionId) -> bool {
        match self.store.observe(tx).await {
            Observed::Decided(decision) => decision,
            Observed::NewlyPending => {
                let seed = self.initial_preference(tx);
                self.spawn_engine(tx, seed).await;
                seed
            }
            Observed::AlreadyPending => self.current_preference(tx).await,
        }
    }

    /// Submit a transaction to the network through this node.
    pub async fn create_transaction(&self, tx: TransactionId) {
        match self.store.observe(tx).await {
            Observed::Decided(decision) => {
                tracing::debug!(node = %self.addr, %tx, decision, "transaction already decided");
            }
            Observed::AlreadyPending => {
                tracing::debug!(node = %self.addr, %tx, "validation already in flight");
            }
            Observed::NewlyPending => {
                tracing::info!(node = %self.addr, %tx, "new transaction, sampling the network");
                let seed = self.initial_preference(tx);
                self.spawn_engine(tx, seed).await;
            }
        }
    }

    /// The final decision for a transaction, once reached.
    pub async fn decision(&self, tx: TransactionId) -> Option<bool> {
        self.store.decision(tx).await
    }

    /// Snapshot of this node's chain in local acceptance order.
    pub async fn chain(&self) -> Vec<TransactionId> {
        self.store.chain().await
    }

    /// Cancel every in-flight engine run; none of them records a decision.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Serve this node's HTTP API on its address.
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        let addr = self.addr;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", addr.value())).await?;
        tracing::info!(node = %addr, "node listening");
        axum::serve(listener, api::build_router(self)).await?;
        Ok(())
    }

    async fn current_preference(&self, tx: TransactionId) -> bool {
        match self.live_preferences.read().await.get(&tx) {
            Some(preference) => *preference.borrow(),
            None => self.initial_preference(tx),
        }
    }

    async fn spawn_engine(&self, tx: TransactionId, seed: bool) {
        let snowball = match Snowball::new(self.params, seed) {
            Ok(snowball) => snowball,
            Err(err) => {
                tracing::error!(node = %self.addr, %tx, %err, "engine rejected validated parameters");
                return;
            }
        };

        let (preference, live) = watch::channel(seed);
        self.live_preferences.write().await.insert(tx, live);

        let run = ValidationRun::new(
            self.addr,
            tx,
            snowball,
            Arc::clone(&self.neighbors),
            Arc::clone(&self.client),
            self.store.clone(),
            preference,
            self.shutdown.subscribe(),
        );
        tokio::spawn(run.run());
    }
}
