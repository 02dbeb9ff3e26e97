// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Response types for the embedding endpoints

use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// Invariant: `dimension == embedding.len()` (512 for CLIP ViT-B/32).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// Correlation id echoed from the request
    pub image_id: Option<String>,

    /// Unit-length embedding vector
    pub embedding: Vec<f32>,

    /// Number of dimensions in `embedding`
    pub dimension: usize,
}

impl EmbedResponse {
    pub fn new(image_id: Option<String>, embedding: Vec<f32>) -> Self {
        let dimension = embedding.len();
        Self {
            image_id,
            embedding,
            dimension,
        }
    }
}

/// Response body for POST /embed/batch
///
/// Contains only the items that succeeded; per-item failures are logged
/// and absent from the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedResponse {
    pub embeddings: Vec<EmbedResponse>,
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub device: String,
}
