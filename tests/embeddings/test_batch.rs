// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Batch orchestration against the real model (ignored unless the ONNX
//! model is downloaded) plus outcome-tagging checks with stub encoders.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clip_embed_node::embeddings::{
    process_batch, BatchItem, BatchItemOutcome, ClipEmbedder, ClipModelConfig, EmbeddingError,
    ItemError,
};
use clip_embed_node::vision::DecodeError;
use image::DynamicImage;
use std::path::PathBuf;

const MODEL_PATH: &str = "/workspace/models/clip-vit-b-32-onnx/model.onnx";

fn png_base64(width: u32, height: u32) -> String {
    let img = DynamicImage::new_rgb8(width, height);
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    STANDARD.encode(buf.into_inner())
}

fn item(payload: String, id: Option<&str>) -> BatchItem {
    BatchItem {
        image_base64: payload,
        image_id: id.map(String::from),
    }
}

fn successful_ids(outcomes: &[BatchItemOutcome]) -> Vec<Option<&str>> {
    outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| o.image_id.as_deref())
        .collect()
}

#[test]
fn test_mixed_batch_tags_only_failures() {
    let items = vec![
        item(png_base64(8, 8), Some("a")),
        item("***".to_string(), Some("b")),
        item(png_base64(4, 4), Some("c")),
        item(STANDARD.encode(b"not an image"), Some("d")),
    ];
    let outcomes = process_batch(&items, |_| Ok(vec![0.1; 4]));

    assert_eq!(outcomes.len(), 4);
    assert_eq!(successful_ids(&outcomes), vec![Some("a"), Some("c")]);
    assert!(matches!(
        outcomes[1].outcome,
        Err(ItemError::Decode(DecodeError::InvalidBase64(_)))
    ));
    assert!(matches!(
        outcomes[3].outcome,
        Err(ItemError::Decode(DecodeError::UnsupportedFormat))
    ));
}

#[test]
fn test_decode_skips_encoder_for_bad_items() {
    let items = vec![
        item("garbage!!".to_string(), None),
        item(png_base64(2, 2), None),
    ];
    let mut encoded = 0;
    let _ = process_batch(&items, |_| {
        encoded += 1;
        Ok(vec![1.0])
    });

    // Only the decodable item reaches the encoder
    assert_eq!(encoded, 1);
}

#[test]
fn test_embedding_error_variant_preserved() {
    let items = vec![item(png_base64(2, 2), Some("only"))];
    let outcomes = process_batch(&items, |_| Err(EmbeddingError::ModelNotReady));

    assert!(matches!(
        outcomes[0].outcome,
        Err(ItemError::Embedding(EmbeddingError::ModelNotReady))
    ));
}

#[tokio::test]
#[ignore] // Only run if the ONNX model is downloaded
async fn test_batch_with_real_model() {
    let config = ClipModelConfig {
        model_path: Some(PathBuf::from(MODEL_PATH)),
        ..Default::default()
    };
    let embedder = ClipEmbedder::initialize(config)
        .await
        .expect("Failed to load CLIP model");

    let items = vec![
        item(png_base64(64, 64), Some("a")),
        item("!!corrupt!!".to_string(), Some("b")),
        item(png_base64(32, 48), Some("c")),
    ];
    let outcomes = tokio::task::spawn_blocking(move || {
        process_batch(&items, |img| embedder.embed_image(img))
    })
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(successful_ids(&outcomes), vec![Some("a"), Some("c")]);
    for outcome in outcomes.iter().filter(|o| o.is_success()) {
        let embedding = outcome.outcome.as_ref().unwrap();
        assert_eq!(embedding.len(), 512);
        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
