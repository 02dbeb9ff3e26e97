// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CLIP image embedding generation
//!
//! The vision model is loaded once per process ([`ClipEmbedder::initialize`])
//! and shared read-only by every request. Each embedding is a single-image
//! forward pass through the ONNX vision encoder followed by L2
//! normalization, so all returned vectors have unit length.

pub mod batch;
pub mod clip_model;
pub mod model_manager;

pub use batch::{process_batch, BatchItem, BatchItemOutcome, ItemError};
pub use clip_model::ClipVisionModel;
pub use model_manager::{ClipEmbedder, ClipModelConfig};

/// Output dimension of the CLIP ViT-B/32 image encoder
pub const EMBEDDING_DIM: usize = 512;

/// Embedding pipeline failures, distinct from input-decode failures.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The generator was invoked before model load completed.
    #[error("Embedding model not loaded")]
    ModelNotReady,

    /// Preprocessing or inference failed after a valid image was accepted.
    #[error("Embedding generation failed: {0}")]
    Generation(String),
}
