// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request types for the embedding endpoints

use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// `image_id` is an opaque caller-supplied correlation id. It is never
/// validated and is echoed back verbatim in the response.
///
/// # Example
/// ```json
/// {
///   "image_base64": "iVBORw0KGgo...",
///   "image_id": "photo-42"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Base64-encoded image data, optionally with a data-URL prefix
    pub image_base64: String,

    /// Optional ID for tracking
    #[serde(default)]
    pub image_id: Option<String>,
}

/// Request body for POST /embed/batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedRequest {
    pub images: Vec<EmbedRequest>,
}
