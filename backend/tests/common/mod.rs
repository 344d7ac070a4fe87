//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use backend::{handlers, media_storage::InMemoryStore, state::AppState};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbImage};
use tower::ServiceExt;

pub const TEST_BUCKET: &str = "test-media";

/// Fixed boundary so multipart bodies can be assembled by hand.
pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

pub const TEST_SIGNED_URL_TTL_SECS: u64 = 3600;

pub fn test_state() -> (AppState, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new(TEST_BUCKET));
    let state = AppState::new(
        store.clone(),
        TEST_BUCKET.to_string(),
        TEST_SIGNED_URL_TTL_SECS,
    );
    (state, store)
}

pub fn test_router() -> (Router, Arc<InMemoryStore>) {
    let (state, store) = test_state();
    (handlers::routes().with_state(state), store)
}

/// Assembles a multipart form with `category`, `entity_id`, and `file`
/// parts.
pub fn multipart_body(
    category: &str,
    entity_id: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("category", category), ("entity_id", entity_id)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn send_multipart(router: &Router, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/assets")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    payload: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn send_delete(router: &Router, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap().status()
}

pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn encode_png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([30, 90, 160])))
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}
