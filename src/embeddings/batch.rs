// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch orchestration with per-item failure isolation
//!
//! Items run sequentially in input order. A failing item is tagged with
//! its error and the batch continues; the returned outcomes always have
//! the same length and order as the input, so callers can correlate
//! position to result. The HTTP layer filters to the successful subset.

use image::DynamicImage;
use tracing::warn;

use crate::embeddings::EmbeddingError;
use crate::vision::{decode_base64_image, DecodeError};

/// One entry of a batch request.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Encoded image payload (raw base64 or data URL)
    pub image_base64: String,
    /// Caller-supplied correlation id, echoed back untouched
    pub image_id: Option<String>,
}

/// Why a single batch item failed.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Tagged outcome for one batch item, in input position.
#[derive(Debug)]
pub struct BatchItemOutcome {
    pub image_id: Option<String>,
    pub outcome: Result<Vec<f32>, ItemError>,
}

impl BatchItemOutcome {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs decode + embed for every item, isolating per-item failures.
///
/// The embed function is passed in so orchestration stays independent of
/// the model handle; production callers hand in
/// `|img| embedder.embed_image(img)`.
pub fn process_batch<F>(items: &[BatchItem], mut embed: F) -> Vec<BatchItemOutcome>
where
    F: FnMut(&DynamicImage) -> Result<Vec<f32>, EmbeddingError>,
{
    items
        .iter()
        .map(|item| {
            let outcome = decode_base64_image(&item.image_base64)
                .map_err(ItemError::from)
                .and_then(|image| embed(&image).map_err(ItemError::from));

            if let Err(ref e) = outcome {
                warn!(image_id = ?item.image_id, "Batch item failed: {}", e);
            }

            BatchItemOutcome {
                image_id: item.image_id.clone(),
                outcome,
            }
        })
        .collect()
}
