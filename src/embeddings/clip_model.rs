// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX wrapper around the CLIP ViT-B/32 vision encoder
//!
//! Features:
//! - ONNX model loading from disk
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - Single-image forward pass producing a raw feature vector
//! - L2 normalization so returned vectors have unit length
//! - 512-dimensional output vectors

use anyhow::{Context, Result};
use ndarray::Array4;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::embeddings::EMBEDDING_DIM;
use crate::vision::CLIP_INPUT_SIZE;

/// ONNX-based CLIP vision encoder
///
/// Inference-only: the session never accumulates gradients or mutates
/// weights, so concurrent readers of one instance are safe by construction.
/// The session itself is serialized behind a `Mutex` since ORT sessions
/// take `&mut self` to run.
pub struct ClipVisionModel {
    /// ONNX Runtime session (locked per forward pass)
    session: Mutex<Session>,

    /// Model input name (usually "pixel_values")
    input_name: String,

    /// Compute device selected at load time ("cuda" or "cpu"), fixed for
    /// the process lifetime
    device: &'static str,

    /// Output dimension (512 for CLIP ViT-B/32)
    dimension: usize,
}

impl std::fmt::Debug for ClipVisionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipVisionModel")
            .field("input_name", &self.input_name)
            .field("device", &self.device)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl ClipVisionModel {
    /// Loads the CLIP vision encoder from an ONNX file on disk.
    ///
    /// Tries the CUDA execution provider first and falls back to CPU; the
    /// chosen device is recorded and reported verbatim in health queries.
    /// A validation inference at load time confirms the model outputs
    /// 512-dimensional features.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - Model doesn't output 512 dimensions
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }

        info!("Initializing CLIP vision encoder with GPU support");

        // Try CUDA-only first to detect if CUDA is actually available
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path);

        let (mut session, device) = match cuda_result {
            Ok(s) => {
                info!("CUDA execution provider initialized");
                (s, "cuda")
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
                let s = Session::builder()
                    .context("Failed to create session builder")?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .context("Failed to set CPU execution provider")?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .context("Failed to set optimization level")?
                    .with_intra_threads(4)
                    .context("Failed to set intra threads")?
                    .commit_from_file(model_path)
                    .context(format!(
                        "Failed to load ONNX model from {}",
                        model_path.display()
                    ))?;
                (s, "cpu")
            }
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        // Validate the output contract with a throwaway forward pass.
        // Wrap in a block so outputs drop before the session moves.
        {
            let size = CLIP_INPUT_SIZE as usize;
            let probe = Array4::<f32>::zeros((1, 3, size, size));
            let outputs = session
                .run(ort::inputs![input_name.as_str() => Value::from_array(probe)?])
                .context("Validation inference failed")?;

            let output_tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            let shape = output_tensor.shape();

            // Image features come out as [batch, 512]
            if shape.last().copied() != Some(EMBEDDING_DIM) {
                anyhow::bail!(
                    "Model outputs unexpected dimensions: {:?} (expected [batch, {}])",
                    shape,
                    EMBEDDING_DIM
                );
            }
        }

        info!("CLIP vision encoder loaded on {}", device);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            device,
            dimension: EMBEDDING_DIM,
        })
    }

    /// Encodes one preprocessed image into a unit-length embedding.
    ///
    /// # Arguments
    /// - `pixels`: NCHW tensor of shape [1, 3, 224, 224] from
    ///   [`crate::vision::preprocess_for_clip`]
    ///
    /// # Returns
    /// - `Result<Vec<f32>>`: 512-dimensional L2-normalized vector,
    ///   deterministic for fixed input and weights
    pub fn encode(&self, pixels: &Array4<f32>) -> Result<Vec<f32>> {
        let shape = pixels.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let input_value =
            Value::from_array(pixels.to_owned()).context("Failed to create input tensor")?;

        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Encoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        // [1, 512] -> flat 512
        let mut embedding: Vec<f32> = output_tensor.iter().copied().collect();

        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Unexpected embedding dimension: {} (expected {})",
                embedding.len(),
                self.dimension
            );
        }

        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    /// Returns the compute device selected at load time ("cuda" or "cpu").
    pub fn device(&self) -> &'static str {
        self.device
    }

    /// Returns the output dimension of this model.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Scales a vector by the inverse of its Euclidean norm.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
