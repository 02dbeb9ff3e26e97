// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from environment variables

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::embeddings::ClipModelConfig;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind host for the HTTP API
    pub host: String,
    /// Bind port for the HTTP API
    pub port: u16,
    /// Hugging Face repo carrying the ONNX CLIP vision encoder
    pub model_repo: String,
    /// File name inside the repo
    pub model_file: String,
    /// Local model path override (skips the hub fetch)
    pub model_path: Option<PathBuf>,
    /// Maximum concurrent forward passes
    pub max_concurrent_inference: usize,
    /// Deadline for a single /embed request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            model_repo: "Qdrant/clip-ViT-B-32-vision".to_string(),
            model_file: "model.onnx".to_string(),
            model_path: None,
            max_concurrent_inference: 2,
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Reads configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("API_HOST").unwrap_or(defaults.host),
            port: env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            model_repo: env::var("CLIP_MODEL_REPO").unwrap_or(defaults.model_repo),
            model_file: env::var("CLIP_MODEL_FILE").unwrap_or(defaults.model_file),
            model_path: env::var("CLIP_MODEL_PATH").ok().map(PathBuf::from),
            max_concurrent_inference: env::var("MAX_CONCURRENT_INFERENCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrent_inference),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    pub fn clip_model_config(&self) -> ClipModelConfig {
        ClipModelConfig {
            model_repo: self.model_repo.clone(),
            model_file: self.model_file.clone(),
            model_path: self.model_path.clone(),
            ..ClipModelConfig::default()
        }
    }
}
