//! Axum-based HTTP channel — the JSON face of the chat service.
//!
//! ```text
//! GET  /api/health
//! POST /api/message          { "message": "..." }
//! POST /api/session/new
//! GET  /api/history
//! GET  /api/history/{id}     (also makes the exchange active)
//! GET  /api/view
//! ```
//!
//! The existing [`CancellationToken`] is wired to axum's graceful shutdown.

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::runtime::{Component, ComponentFuture};
use crate::chat::ChatService;
use crate::error::AppError;

/// Axum router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone: all fields are reference-counted.
#[derive(Clone)]
pub struct AxumState {
    /// Channel identifier used in log spans.
    pub channel_id: Arc<str>,
    pub chat: Arc<ChatService>,
}

pub struct AxumChannel {
    channel_id: String,
    bind_addr: String,
    chat: Arc<ChatService>,
}

impl AxumChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bind_addr: impl Into<String>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            bind_addr: bind_addr.into(),
            chat,
        }
    }
}

impl Component for AxumChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_axum(self.channel_id, self.bind_addr, self.chat, shutdown))
    }
}

async fn run_axum(
    channel_id: String,
    bind_addr: String,
    chat: Arc<ChatService>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(AxumState {
        channel_id: Arc::from(channel_id.as_str()),
        chat,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("axum bind failed on {bind_addr}: {e}")))?;

    info!(%channel_id, %bind_addr, "axum channel listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("axum server error: {e}")))?;

    info!(%channel_id, "axum channel shut down");
    Ok(())
}

pub fn build_router(state: AxumState) -> Router {
    Router::new()
        .route("/api/health",       get(api::health))
        .route("/api/message",      post(api::message))
        .route("/api/session/new",  post(api::new_session))
        .route("/api/history",      get(api::history))
        .route("/api/history/{id}", get(api::select))
        .route("/api/view",         get(api::view))
        .with_state(state)
}
