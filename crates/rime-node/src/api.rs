//! Per-node HTTP API.
//!
//! Thin marshalling over the node's core operations; every handler answers
//! immediately with the node's best current knowledge, never waiting on
//! convergence. The wire types here are shared with the HTTP peer client.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rime_consensus::TransactionId;
use rime_topology::NodeAddress;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::node::Node;

/// Body of a peer validation probe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TxValidationRequest {
    pub tx: TransactionId,
}

/// A node's current preference for a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TxValidationResponse {
    pub pref: bool,
}

/// Body of a create-transaction request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateTxRequest {
    pub tx: TransactionId,
}

/// One node's local chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub addr: NodeAddress,
    pub chain: Vec<TransactionId>,
}

/// One node's neighbor set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborsResponse {
    pub addr: NodeAddress,
    pub neighbors: Vec<NodeAddress>,
}

/// Build one node's router.
pub fn build_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/validate", post(validate))
        .route("/createTx", post(create_tx))
        .route("/listChain", get(list_chain))
        .route("/neighbors", get(list_neighbors))
        .layer(cors)
        .with_state(node)
}

async fn validate(
    State(node): State<Arc<Node>>,
    Json(req): Json<TxValidationRequest>,
) -> Json<TxValidationResponse> {
    let pref = node.handle_query(req.tx).await;
    Json(TxValidationResponse { pref })
}

async fn create_tx(
    State(node): State<Arc<Node>>,
    Json(req): Json<CreateTxRequest>,
) -> &'static str {
    node.create_transaction(req.tx).await;
    "OK"
}

async fn list_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    Json(ChainResponse {
        addr: node.addr(),
        chain: node.chain().await,
    })
}

async fn list_neighbors(State(node): State<Arc<Node>>) -> Json<NeighborsResponse> {
    Json(NeighborsResponse {
        addr: node.addr(),
        neighbors: node.neighbors().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rime_consensus::Parameters;

    use crate::error::Result;
    use crate::peer::PeerClient;

    struct NoPeers;

    #[async_trait]
    impl PeerClient for NoPeers {
        async fn query(&self, peer: NodeAddress, _tx: TransactionId) -> Result<bool> {
            Err(crate::error::Error::PeerUnreachable {
                peer,
                reason: "test double".into(),
            })
        }
    }

    #[tokio::test]
    async fn router_builds() {
        let node = Node::new(
            NodeAddress::new(0),
            (1..=5).map(NodeAddress::new).collect(),
            100,
            Parameters::new(3, 2, 3),
            Arc::new(NoPeers),
        )
        .await
        .expect("valid node");
        let _router = build_router(node);
    }

    #[test]
    fn wire_types_round_trip() {
        let req = TxValidationRequest {
            tx: TransactionId::new(42),
        };
        let json = serde_json::to_string(&req).expect("serialize");
        assert_eq!(json, r#"{"tx":42}"#);

        let res: TxValidationResponse =
            serde_json::from_str(r#"{"pref":true}"#).expect("deserialize");
        assert!(res.pref);
    }
}
