// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use std::env;

use clip_embed_node::api::{start_server, AppState};
use clip_embed_node::{ClipEmbedder, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::from_env();
    let addr = config.bind_addr()?;
    let state = AppState::new(&config);

    // Load the model in the background so /health answers (model_loaded:
    // false) while startup is still in flight.
    let load_state = state.clone();
    let model_config = config.clip_model_config();
    tokio::spawn(async move {
        tracing::info!("Loading CLIP vision model ({})", model_config.model_repo);
        match ClipEmbedder::initialize(model_config).await {
            Ok(embedder) => {
                tracing::info!(
                    "CLIP model {} loaded (device: {})",
                    embedder.model_repo(),
                    embedder.device()
                );
                load_state.set_embedder(embedder).await;
            }
            Err(e) => {
                tracing::error!("Failed to load CLIP model: {:#}", e);
            }
        }
    });

    start_server(state.clone(), addr).await?;

    tracing::info!("Shutting down embedding service");
    state.release_embedder().await;

    Ok(())
}
