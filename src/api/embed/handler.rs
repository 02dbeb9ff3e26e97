// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /embed and POST /embed/batch handlers
//!
//! Inference is a blocking, potentially multi-hundred-millisecond
//! operation, so both handlers push it onto the blocking pool behind a
//! semaphore that bounds concurrent forward passes. The single-image path
//! additionally carries a per-request deadline.

use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::error;

use crate::api::embed::{BatchEmbedRequest, BatchEmbedResponse, EmbedRequest, EmbedResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::embeddings::{process_batch, BatchItem, EmbeddingError};
use crate::vision::decode_base64_image;

/// Runs one embed closure on the blocking pool, bounded by the inference
/// semaphore and the request deadline.
///
/// The deadline covers queueing for a permit as well as the forward pass
/// itself, so a saturated accelerator surfaces as [`ApiError::Timeout`].
async fn embed_with_deadline<F>(
    permits: Arc<Semaphore>,
    deadline: Duration,
    embed: F,
) -> Result<Vec<f32>, ApiError>
where
    F: FnOnce() -> Result<Vec<f32>, EmbeddingError> + Send + 'static,
{
    tokio::time::timeout(deadline, async move {
        let _permit = permits
            .acquire_owned()
            .await
            .map_err(|_| ApiError::ServiceUnavailable("Inference queue closed".to_string()))?;

        tokio::task::spawn_blocking(embed)
            .await
            .map_err(|e| ApiError::InternalError(format!("Inference task failed: {}", e)))?
            .map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Timeout)?
}

/// POST /embed - Generate an embedding for a single image
///
/// Decode runs before the readiness check, so a malformed payload is
/// rejected with 400 even while the model is still loading.
///
/// # Errors
/// - 400 if the payload is not valid base64 or a supported image format
/// - 503 if the model has not finished loading
/// - 500 if preprocessing or inference fails
/// - 504 if the request exceeds the configured deadline
pub async fn embed_handler(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let payload = request.image_base64;
    let image = tokio::task::spawn_blocking(move || decode_base64_image(&payload))
        .await
        .map_err(|e| ApiError::InternalError(format!("Decode task failed: {}", e)))??;

    let embedder = state
        .embedder
        .read()
        .await
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("Model not loaded".to_string()))?;

    let embedding = embed_with_deadline(
        state.inference_permits.clone(),
        state.request_timeout,
        move || embedder.embed_image(&image),
    )
    .await?;

    Ok(Json(EmbedResponse::new(request.image_id, embedding)))
}

/// POST /embed/batch - Generate embeddings for multiple images
///
/// Best-effort: items are processed sequentially in input order, failures
/// are logged and skipped, and the response always carries status 200 with
/// the successful subset.
pub async fn embed_batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchEmbedRequest>,
) -> Json<BatchEmbedResponse> {
    let items: Vec<BatchItem> = request
        .images
        .into_iter()
        .map(|r| BatchItem {
            image_base64: r.image_base64,
            image_id: r.image_id,
        })
        .collect();

    let embedder = state.embedder.read().await.clone();

    let outcomes = match embedder {
        Some(embedder) => {
            let permit = state.inference_permits.clone().acquire_owned().await.ok();
            let task = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                process_batch(&items, |image| embedder.embed_image(image))
            })
            .await;

            match task {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    error!("Batch task failed: {}", e);
                    Vec::new()
                }
            }
        }
        // No model yet: every item fails the same way, and the batch
        // contract still answers 200 with an empty subset.
        None => process_batch(&items, |_| Err(EmbeddingError::ModelNotReady)),
    };

    let embeddings = outcomes
        .into_iter()
        .filter_map(|o| match o.outcome {
            Ok(vector) => Some(EmbedResponse::new(o.image_id, vector)),
            Err(_) => None,
        })
        .collect();

    Json(BatchEmbedResponse { embeddings })
}
