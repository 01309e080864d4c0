//! Axum-based RPC server.
//!
//! One POST endpoint at `/` accepts both envelope shapes; `/metrics`
//! serves the Prometheus text format.

use axum::{extract::State, http::header, response::IntoResponse, routing::get, routing::post, Router};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::dispatch::Context;
use crate::envelope::process_request;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    #[error("serve failed: {0}")]
    Serve(#[source] std::io::Error),
}

pub struct RpcServer {
    pub port: u16,
}

impl RpcServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn router(ctx: Arc<Context>) -> Router {
        Router::new()
            .route("/", post(handle_rpc))
            .route("/metrics", get(handle_metrics))
            .layer(CorsLayer::permissive())
            .with_state(ctx)
    }

    /// Bind and serve until the task is cancelled.
    pub async fn start(&self, ctx: Arc<Context>) -> Result<(), ServerError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(ServerError::Bind)?;
        info!("RPC server listening on {addr}");
        axum::serve(listener, Self::router(ctx))
            .await
            .map_err(ServerError::Serve)
    }
}

async fn handle_rpc(State(ctx): State<Arc<Context>>, body: String) -> impl IntoResponse {
    let response = process_request(&ctx, &body);
    (
        [(header::CONTENT_TYPE, "application/json")],
        response.to_string(),
    )
}

async fn handle_metrics(State(ctx): State<Arc<Context>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        ctx.metrics.encode(),
    )
}
