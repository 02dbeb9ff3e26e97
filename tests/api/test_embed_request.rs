// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Wire-format tests for the embedding request types

use clip_embed_node::api::embed::{BatchEmbedRequest, EmbedRequest};

#[test]
fn test_single_request_minimal() {
    let json = r#"{"image_base64": "aVZCT1J3"}"#;
    let req: EmbedRequest = serde_json::from_str(json).unwrap();

    assert_eq!(req.image_base64, "aVZCT1J3");
    assert!(req.image_id.is_none());
}

#[test]
fn test_single_request_with_id() {
    let json = r#"{"image_base64": "aVZCT1J3", "image_id": "photo-7"}"#;
    let req: EmbedRequest = serde_json::from_str(json).unwrap();

    assert_eq!(req.image_id.as_deref(), Some("photo-7"));
}

#[test]
fn test_image_id_is_opaque() {
    // Any string is accepted; the id is never validated
    let json = r#"{"image_base64": "YQ==", "image_id": "  weird id  "}"#;
    let req: EmbedRequest = serde_json::from_str(json).unwrap();
    assert!(req.image_id.is_some());
}

#[test]
fn test_missing_payload_rejected() {
    let json = r#"{"image_id": "no-payload"}"#;
    assert!(serde_json::from_str::<EmbedRequest>(json).is_err());
}

#[test]
fn test_batch_request_order_preserved() {
    let json = r#"{"images": [
        {"image_base64": "YQ==", "image_id": "first"},
        {"image_base64": "Yg=="},
        {"image_base64": "Yw==", "image_id": "third"}
    ]}"#;
    let req: BatchEmbedRequest = serde_json::from_str(json).unwrap();

    assert_eq!(req.images.len(), 3);
    assert_eq!(req.images[0].image_id.as_deref(), Some("first"));
    assert!(req.images[1].image_id.is_none());
    assert_eq!(req.images[2].image_id.as_deref(), Some("third"));
}
