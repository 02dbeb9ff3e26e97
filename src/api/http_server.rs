// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::{RwLock, Semaphore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::embed::{embed_batch_handler, embed_handler, HealthResponse};
use crate::config::ServiceConfig;
use crate::embeddings::ClipEmbedder;

/// Shared request-handler state.
///
/// The embedder slot starts empty and is filled once the background load
/// completes; handlers read it without ever mutating the model itself.
#[derive(Clone)]
pub struct AppState {
    pub embedder: Arc<RwLock<Option<Arc<ClipEmbedder>>>>,
    pub inference_permits: Arc<Semaphore>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            embedder: Arc::new(RwLock::new(None)),
            inference_permits: Arc::new(Semaphore::new(config.max_concurrent_inference)),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn new_for_test() -> Self {
        Self::new(&ServiceConfig::default())
    }

    /// Installs the loaded embedder, making the service ready.
    pub async fn set_embedder(&self, embedder: ClipEmbedder) {
        *self.embedder.write().await = Some(Arc::new(embedder));
    }

    pub async fn is_ready(&self) -> bool {
        self.embedder.read().await.is_some()
    }

    /// Takes the embedder out of the slot and releases it.
    pub async fn release_embedder(&self) {
        if let Some(embedder) = self.embedder.write().await.take() {
            match Arc::try_unwrap(embedder) {
                Ok(embedder) => embedder.shutdown(),
                // An in-flight request still holds a reference; the last
                // drop releases the session.
                Err(_) => tracing::debug!("Embedder still shared at shutdown"),
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/embed", post(embed_handler))
        .route("/embed/batch", post(embed_batch_handler))
        .layer(TraceLayer::new_for_http())
        // All origins/methods/headers: local/internal deployment only.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Embedding API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

/// GET /health - liveness plus model readiness and compute device
pub async fn health_handler(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    let embedder = state.embedder.read().await;
    let health = match embedder.as_ref() {
        Some(e) => HealthResponse {
            status: "healthy".to_string(),
            model_loaded: true,
            device: e.device().to_string(),
        },
        None => HealthResponse {
            status: "healthy".to_string(),
            model_loaded: false,
            device: "cpu".to_string(),
        },
    };
    axum::Json(health)
}
