//! Thumbnail backfill sweep tests

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use backend::{backfill, media_storage::ObjectStore};
use bytes::Bytes;
use common::{encode_jpeg, test_state};

async fn seed(store: &dyn ObjectStore, key: &str, bytes: Vec<u8>, content_type: &str) {
    store
        .put(key, Bytes::from(bytes), content_type, HashMap::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn dry_run_counts_without_writing() {
    let (_state, store) = test_state();
    seed(&*store, "logos/1/logo.jpg", encode_jpeg(200, 200), "image/jpeg").await;
    seed(&*store, "covers/1/cover.jpg", encode_jpeg(800, 450), "image/jpeg").await;
    seed(&*store, "documents/1/handbook.pdf", b"%PDF-1.7".to_vec(), "application/pdf").await;
    let puts_before = store.put_count();

    let report = backfill::run(store.clone(), "", true).await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.generated, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(store.put_count(), puts_before, "dry run must not upload");
}

#[tokio::test]
async fn sweep_generates_missing_thumbnails() {
    let (_state, store) = test_state();
    seed(&*store, "logos/1/logo.jpg", encode_jpeg(200, 200), "image/jpeg").await;
    seed(&*store, "galleries/1/image_1.png", common::encode_png(500, 500), "image/png").await;

    let report = backfill::run(store.clone(), "", false).await.unwrap();

    assert_eq!(report.generated, 2);
    assert_eq!(report.failed, 0);
    assert!(store.contains("logos/1/logo_thumb.jpg"));
    assert!(store.contains("galleries/1/image_1_thumb.png"));
}

#[tokio::test]
async fn second_sweep_is_a_no_op() {
    let (_state, store) = test_state();
    seed(&*store, "logos/1/logo.jpg", encode_jpeg(200, 200), "image/jpeg").await;

    backfill::run(store.clone(), "", false).await.unwrap();
    let puts_after_first = store.put_count();

    let report = backfill::run(store.clone(), "", false).await.unwrap();
    assert_eq!(report.generated, 0);
    assert_eq!(report.scanned, 2, "original plus its thumbnail");
    assert_eq!(report.skipped, 2);
    assert_eq!(store.put_count(), puts_after_first);
}

#[tokio::test]
async fn corrupt_originals_are_counted_and_do_not_abort() {
    let (_state, store) = test_state();
    seed(&*store, "covers/1/cover.jpg", b"garbage".to_vec(), "image/jpeg").await;
    seed(&*store, "covers/2/cover.jpg", encode_jpeg(800, 450), "image/jpeg").await;

    let report = backfill::run(store.clone(), "", false).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.generated, 1);
    assert!(!store.contains("covers/1/cover_thumb.jpg"));
    assert!(store.contains("covers/2/cover_thumb.jpg"));
}

#[tokio::test]
async fn prefix_restricts_the_sweep() {
    let (_state, store) = test_state();
    seed(&*store, "logos/1/logo.jpg", encode_jpeg(100, 100), "image/jpeg").await;
    seed(&*store, "covers/1/cover.jpg", encode_jpeg(800, 450), "image/jpeg").await;

    let report = backfill::run(store.clone(), "logos/", false).await.unwrap();

    assert_eq!(report.scanned, 1);
    assert!(store.contains("logos/1/logo_thumb.jpg"));
    assert!(!store.contains("covers/1/cover_thumb.jpg"));
}
