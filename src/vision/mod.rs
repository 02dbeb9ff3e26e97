// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image decoding and CLIP preprocessing

pub mod image_utils;
pub mod preprocessing;

pub use image_utils::{decode_base64_image, decode_image_bytes, detect_format, DecodeError};
pub use preprocessing::{preprocess_for_clip, CLIP_INPUT_SIZE};
