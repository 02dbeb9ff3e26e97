// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model lifecycle tests
//!
//! Everything touching the real ONNX session is `#[ignore]`d; run with
//! `cargo test -- --ignored` after downloading the model to MODEL_PATH.

use clip_embed_node::embeddings::{ClipEmbedder, ClipModelConfig, ClipVisionModel, EMBEDDING_DIM};
use clip_embed_node::vision::preprocess_for_clip;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::PathBuf;

const MODEL_PATH: &str = "/workspace/models/clip-vit-b-32-onnx/model.onnx";

fn model_config() -> ClipModelConfig {
    ClipModelConfig {
        model_path: Some(PathBuf::from(MODEL_PATH)),
        ..Default::default()
    }
}

#[test]
fn test_default_config_targets_vit_b_32() {
    let config = ClipModelConfig::default();
    assert_eq!(config.model_repo, "Qdrant/clip-ViT-B-32-vision");
    assert_eq!(config.model_file, "model.onnx");
    assert_eq!(config.dimension, EMBEDDING_DIM);
    assert!(config.model_path.is_none());
}

#[test]
fn test_missing_model_file_errors() {
    let result = ClipVisionModel::new("/nonexistent/path/model.onnx");
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("not found"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_initialize_with_missing_local_path() {
    let config = ClipModelConfig {
        model_path: Some(PathBuf::from("/nonexistent/model.onnx")),
        ..Default::default()
    };
    assert!(ClipEmbedder::initialize(config).await.is_err());
}

#[tokio::test]
#[ignore] // Only run if the ONNX model is downloaded
async fn test_embedding_is_unit_length() {
    let embedder = ClipEmbedder::initialize(model_config())
        .await
        .expect("Failed to load CLIP model");

    assert_eq!(embedder.dimension(), EMBEDDING_DIM);

    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([200, 40, 40])));
    let embedding = embedder.embed_image(&img).unwrap();

    assert_eq!(embedding.len(), EMBEDDING_DIM);
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4, "norm was {}", norm);
}

#[tokio::test]
#[ignore] // Only run if the ONNX model is downloaded
async fn test_embedding_is_deterministic() {
    let embedder = ClipEmbedder::initialize(model_config())
        .await
        .expect("Failed to load CLIP model");

    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([10, 120, 250])));
    let first = embedder.embed_image(&img).unwrap();
    let second = embedder.embed_image(&img).unwrap();

    for (a, b) in first.iter().zip(second.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[tokio::test]
#[ignore] // Only run if the ONNX model is downloaded
async fn test_distinct_images_produce_distinct_embeddings() {
    let embedder = ClipEmbedder::initialize(model_config())
        .await
        .expect("Failed to load CLIP model");

    let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 0, 0])));
    let blue = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([0, 0, 255])));

    let a = embedder.embed_image(&red).unwrap();
    let b = embedder.embed_image(&blue).unwrap();

    let cosine: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    assert!(cosine < 0.999, "embeddings should differ, cosine {}", cosine);
}

#[test]
#[ignore] // Only run if the ONNX model is downloaded
fn test_encode_rejects_wrong_shape() {
    let model = ClipVisionModel::new(MODEL_PATH).expect("Failed to load CLIP model");

    let bad = ndarray::Array4::<f32>::zeros((2, 3, 224, 224));
    assert!(model.encode(&bad).is_err());

    let good = preprocess_for_clip(&DynamicImage::new_rgb8(50, 50));
    assert!(model.encode(&good).is_ok());
}
