// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image payload decoding for the embedding pipeline
//!
//! Accepts raw base64 or data-URL payloads (`data:image/png;base64,...`),
//! detects the container format from magic bytes, and canonicalizes the
//! decoded raster to 3-channel 8-bit RGB.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Errors produced while turning an encoded payload into a canonical image.
///
/// All of these are client-input faults and map to HTTP 400 at the API layer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Decode a base64-encoded image payload into a canonical RGB8 image.
///
/// A data-URL style prefix (everything up to and including the first `,`)
/// is stripped if present, so `data:image/png;base64,<data>` decodes
/// identically to `<data>` alone.
///
/// No size or dimension limits are enforced; the only validation is that
/// the payload is valid base64 carrying a supported raster format.
pub fn decode_base64_image(base64_str: &str) -> Result<DynamicImage, DecodeError> {
    if base64_str.is_empty() {
        return Err(DecodeError::EmptyData);
    }

    // Strip a data-URL header if one is present.
    let data = match base64_str.find(',') {
        Some(idx) => &base64_str[idx + 1..],
        None => base64_str,
    };

    let bytes = STANDARD.decode(data)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes into a canonical RGB8 image.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

    // Canonical representation: 3-channel, 8-bit. Drops alpha, expands
    // grayscale, so the preprocessing stage sees one pixel layout.
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// Detect image format from magic bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(DecodeError::UnsupportedFormat),
    }
}
