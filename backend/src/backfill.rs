//! Thumbnail backfill sweep
//!
//! Walks the bucket and generates missing thumbnails for already-stored
//! image originals. Individual failures are counted and logged; the
//! sweep keeps going. Only listing failures abort, since the sweep
//! cannot make progress without keys.

use std::sync::Arc;

use asset_keys::{is_thumbnail_key, AssetCategory};
use tracing::{info, warn};

use crate::media_storage::{ObjectStore, StorageResult};
use crate::thumbnails::ThumbnailPipeline;

/// Outcome counters for one sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Keys examined
    pub scanned: usize,
    /// Thumbnails generated (or that would be, in dry-run mode)
    pub generated: usize,
    /// Keys skipped: thumbnails, non-image categories, already covered
    pub skipped: usize,
    /// Keys where generation failed
    pub failed: usize,
}

/// Sweeps `prefix` and fills in missing thumbnails.
///
/// With `dry_run` set, reports what would be generated without writing
/// anything.
///
/// # Errors
///
/// Only listing failures abort the sweep.
pub async fn run(
    store: Arc<dyn ObjectStore>,
    prefix: &str,
    dry_run: bool,
) -> StorageResult<BackfillReport> {
    let pipeline = ThumbnailPipeline::new(store.clone());
    let mut report = BackfillReport::default();

    for key in store.list_keys(prefix).await? {
        report.scanned += 1;

        if is_thumbnail_key(&key) {
            report.skipped += 1;
            continue;
        }
        let Some(category) = AssetCategory::from_key(&key) else {
            report.skipped += 1;
            continue;
        };
        if !category.is_image() {
            report.skipped += 1;
            continue;
        }

        let thumbnail_key = asset_keys::derive_thumbnail_key(&key);
        match store.exists(&thumbnail_key).await {
            Ok(true) => {
                report.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "existence check failed");
                report.failed += 1;
                continue;
            }
        }

        if dry_run {
            info!(key = %key, thumbnail = %thumbnail_key, "would generate thumbnail");
            report.generated += 1;
            continue;
        }

        let bytes = match store.get(&key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "download failed");
                report.failed += 1;
                continue;
            }
        };
        match pipeline.ensure_thumbnail(&key, &bytes, category).await {
            Ok(_) => report.generated += 1,
            Err(e) => {
                warn!(key = %key, error = %e, "thumbnail generation failed");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
