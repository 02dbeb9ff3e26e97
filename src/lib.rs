// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod vision;

pub use config::ServiceConfig;
pub use embeddings::{ClipEmbedder, ClipModelConfig, EmbeddingError, EMBEDDING_DIM};
pub use vision::DecodeError;
