// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide CLIP model lifecycle
//!
//! The model is identified by a fixed external identifier (Hugging Face
//! repo + file), resolved through `hf-hub` (or a local path override),
//! loaded exactly once before inference is served, and released at
//! process shutdown. The handle is immutable after creation and shared
//! read-only by every request.

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::PathBuf;
use tracing::info;

use crate::embeddings::{ClipVisionModel, EmbeddingError, EMBEDDING_DIM};
use crate::vision::preprocess_for_clip;

/// Configuration for loading the CLIP vision model
#[derive(Debug, Clone)]
pub struct ClipModelConfig {
    /// Hugging Face repo carrying the ONNX export
    pub model_repo: String,
    /// File name inside the repo
    pub model_file: String,
    /// Local path override; skips the hub lookup when set
    pub model_path: Option<PathBuf>,
    /// Expected embedding dimensions (must be 512)
    pub dimension: usize,
}

impl Default for ClipModelConfig {
    fn default() -> Self {
        Self {
            model_repo: "Qdrant/clip-ViT-B-32-vision".to_string(),
            model_file: "model.onnx".to_string(),
            model_path: None,
            dimension: EMBEDDING_DIM,
        }
    }
}

/// Process-wide embedding service handle
///
/// Created once at startup via [`ClipEmbedder::initialize`], then shared
/// behind an `Arc` by every in-flight request. Inference never mutates the
/// model, so no synchronization beyond the session's own lock is needed.
#[derive(Debug)]
pub struct ClipEmbedder {
    model: ClipVisionModel,
    config: ClipModelConfig,
}

impl ClipEmbedder {
    /// Loads the CLIP vision model and validates its output dimension.
    ///
    /// Model resolution and session creation are blocking (network fetch,
    /// disk read, ONNX graph optimization), so both run on the blocking
    /// pool. Any failure releases partially acquired resources on the way
    /// out; there is no partial or incremental reload.
    pub async fn initialize(config: ClipModelConfig) -> Result<Self> {
        let model_path = match &config.model_path {
            Some(path) => path.clone(),
            None => {
                let repo = config.model_repo.clone();
                let file = config.model_file.clone();
                info!("Fetching model {}/{}", repo, file);
                tokio::task::spawn_blocking(move || -> Result<PathBuf> {
                    let api = hf_hub::api::sync::Api::new()
                        .context("Failed to initialize Hugging Face hub client")?;
                    api.model(repo.clone())
                        .get(&file)
                        .context(format!("Failed to fetch {} from {}", file, repo))
                })
                .await
                .context("Model fetch task failed")??
            }
        };

        let model = tokio::task::spawn_blocking(move || ClipVisionModel::new(&model_path))
            .await
            .context("Model load task failed")??;

        if model.dimension() != config.dimension {
            anyhow::bail!(
                "Model dimension mismatch: expected {}, got {}",
                config.dimension,
                model.dimension()
            );
        }

        info!(
            "CLIP embedder initialized ({} dimensions, device: {})",
            model.dimension(),
            model.device()
        );

        Ok(Self { model, config })
    }

    /// Generates a unit-length embedding for one canonical image.
    ///
    /// Blocking: preprocessing plus a full forward pass. Callers on the
    /// async runtime must offload this with `spawn_blocking`.
    pub fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbeddingError> {
        let pixels = preprocess_for_clip(image);
        self.model
            .encode(&pixels)
            .map_err(|e| EmbeddingError::Generation(format!("{e:#}")))
    }

    /// Returns the compute device selected at load time.
    pub fn device(&self) -> &'static str {
        self.model.device()
    }

    /// Returns the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Returns the configured model identifier.
    pub fn model_repo(&self) -> &str {
        &self.config.model_repo
    }

    /// Releases the model session and any device memory it holds.
    ///
    /// Dropping the handle has the same effect; this spells out the
    /// shutdown edge of the lifecycle.
    pub fn shutdown(self) {
        info!("Releasing CLIP model resources");
        drop(self);
    }
}
