//! Upload and delete endpoint tests

mod common;

use axum::http::StatusCode;
use common::{
    encode_jpeg, multipart_body, response_json, send_delete, send_multipart, test_router,
};

#[tokio::test]
async fn upload_stores_original_and_thumbnail() {
    let (router, store) = test_router();
    let body = multipart_body(
        "cover",
        "42",
        "Campus Photo.JPG",
        "image/jpeg",
        &encode_jpeg(2000, 2000),
    );

    let response = send_multipart(&router, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["key"], "covers/42/cover.jpg");
    assert_eq!(json["contentType"], "image/jpeg");
    assert_eq!(json["originalName"], "Campus Photo.JPG");
    assert!(json["url"].as_str().unwrap().contains("X-Amz-Signature="));

    assert!(store.contains("covers/42/cover.jpg"));
    assert!(store.contains("covers/42/cover_thumb.jpg"));

    let thumb = store.object_bytes("covers/42/cover_thumb.jpg").unwrap();
    let decoded = image::load_from_memory(&thumb).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (640, 360));
}

#[tokio::test]
async fn unknown_category_is_rejected_before_storage() {
    let (router, store) = test_router();
    let body = multipart_body("poster", "42", "a.jpg", "image/jpeg", &encode_jpeg(10, 10));

    let response = send_multipart(&router, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "unknown_category");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_storage() {
    let (router, store) = test_router();
    let oversized = vec![0_u8; 15 * 1024 * 1024 + 1];
    let body = multipart_body("cover", "42", "big.jpg", "image/jpeg", &oversized);

    let response = send_multipart(&router, body).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "payload_too_large");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn disallowed_content_type_is_rejected() {
    let (router, store) = test_router();
    let body = multipart_body("logo", "42", "anim.gif", "image/gif", &[0_u8; 64]);

    let response = send_multipart(&router, body).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn missing_entity_id_is_rejected() {
    let (router, store) = test_router();

    // Hand-rolled body without the entity_id part
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\nlogo\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n",
            b = common::BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(&common::encode_png(4, 4));
    body.extend_from_slice(format!("\r\n--{}--\r\n", common::BOUNDARY).as_bytes());

    let response = send_multipart(&router, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "missing_field");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn undecodable_image_keeps_the_original_without_a_thumbnail() {
    let (router, store) = test_router();
    let body = multipart_body("logo", "42", "logo.png", "image/png", b"not really a png");

    let response = send_multipart(&router, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(store.contains("logos/42/logo.png"));
    assert!(!store.contains("logos/42/logo_thumb.png"));
}

#[tokio::test]
async fn delete_removes_original_and_thumbnail() {
    let (router, store) = test_router();
    let body = multipart_body("logo", "42", "logo.jpg", "image/jpeg", &encode_jpeg(300, 300));
    assert_eq!(send_multipart(&router, body).await.status(), StatusCode::OK);
    assert!(store.contains("logos/42/logo_thumb.jpg"));

    let status = send_delete(&router, "/v1/assets/logos/42/logo.jpg").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!store.contains("logos/42/logo.jpg"));
    assert!(!store.contains("logos/42/logo_thumb.jpg"));
}

#[tokio::test]
async fn delete_of_an_absent_key_still_answers_no_content() {
    let (router, _store) = test_router();

    let status = send_delete(&router, "/v1/assets/logos/42/logo.jpg").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_rejects_malformed_keys() {
    let (router, _store) = test_router();

    let status = send_delete(&router, "/v1/assets/logos/..%2Fsecrets/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
