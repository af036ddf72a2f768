//! Public web gateway.
//!
//! The outward-facing entry point of the simulation: forwards transaction
//! creation to a uniformly random node and aggregates every node's local
//! chain for observability. The gateway holds no consensus state of its
//! own; it only marshals requests to the node APIs.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use futures::future::join_all;
use rand::seq::SliceRandom;
use rime_consensus::TransactionId;
use rime_topology::NodeAddress;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{ChainResponse, CreateTxRequest};
use crate::error::Result;

struct GatewayState {
    nodes: Vec<NodeAddress>,
    http: reqwest::Client,
    host: String,
}

/// The public gateway server.
pub struct Gateway {
    state: Arc<GatewayState>,
    port: u16,
}

impl Gateway {
    /// Gateway over the given node addresses, served on `port`.
    pub fn new(nodes: Vec<NodeAddress>, port: u16) -> Self {
        Self {
            state: Arc::new(GatewayState {
                nodes,
                http: reqwest::Client::new(),
                host: "127.0.0.1".into(),
            }),
            port,
        }
    }

    /// Build the gateway router.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/createTx/:val", post(create_tx))
            .route("/chain", get(aggregate_chains))
            .layer(cors)
            .with_state(Arc::clone(&self.state))
    }

    /// Run the gateway server.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.port)).await?;
        tracing::info!(port = self.port, "gateway listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn create_tx(
    State(state): State<Arc<GatewayState>>,
    Path(val): Path<u64>,
) -> std::result::Result<&'static str, StatusCode> {
    let target = {
        let mut rng = rand::thread_rng();
        state
            .nodes
            .choose(&mut rng)
            .copied()
            .ok_or(StatusCode::SERVICE_UNAVAILABLE)?
    };

    let tx = TransactionId::new(val);
    tracing::info!(%tx, node = %target, "forwarding transaction creation");

    let url = format!("http://{}:{}/createTx", state.host, target.value());
    state
        .http
        .post(&url)
        .json(&CreateTxRequest { tx })
        .send()
        .await
        .map_err(|err| {
            tracing::error!(node = %target, %err, "create forward failed");
            StatusCode::BAD_GATEWAY
        })?;

    Ok("OK")
}

async fn aggregate_chains(State(state): State<Arc<GatewayState>>) -> Json<Vec<ChainResponse>> {
    let fetches = state.nodes.iter().copied().map(|node| {
        let url = format!("http://{}:{}/listChain", state.host, node.value());
        let http = state.http.clone();
        async move {
            let response = match http.get(&url).send().await {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!(node = %node, %err, "chain fetch failed");
                    return None;
                }
            };
            match response.json::<ChainResponse>().await {
                Ok(chain) => Some(chain),
                Err(err) => {
                    tracing::debug!(node = %node, %err, "chain decode failed");
                    None
                }
            }
        }
    });

    let chains = join_all(fetches).await.into_iter().flatten().collect();
    Json(chains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds() {
        let nodes = (9000u16..9010).map(NodeAddress::new).collect();
        let gateway = Gateway::new(nodes, 3000);
        let _router = gateway.router();
    }
}
