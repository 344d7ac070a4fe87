//! S3-backed gateway implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    error::SdkError,
    operation::{get_object::GetObjectError, head_object::HeadObjectError},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client as S3Client,
};
use bytes::Bytes;
use chrono::DateTime;
use tracing::debug;

use super::{AssetInfo, ObjectStore, StorageError, StorageResult};

/// Object-store gateway over one configured bucket.
pub struct MediaStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl MediaStorage {
    /// Creates a gateway for `bucket_name` over a pre-configured client.
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }

    /// Bucket this gateway is scoped to.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl ObjectStore for MediaStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        debug!(key = %key, size = bytes.len(), "uploading object");

        let mut request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes));
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(StorageError::Transport(e.to_string())),
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let result = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Transport(e.to_string()))?;
                Ok(data.into_bytes())
            }
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) =>
            {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(StorageError::Transport(e.to_string())),
        }
    }

    async fn get_signed_url(&self, key: &str, ttl_secs: u64) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| StorageError::Config(format!("invalid presigning config: {e}")))?;

        let presigned = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning)
            .await;

        match presigned {
            Ok(request) => Ok(request.uri().to_string()),
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(StorageError::Transport(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        debug!(key = %key, "deleting object");

        // S3 answers 204 for absent keys, so deletion is idempotent from
        // the caller's perspective; only transport failures surface.
        let result = self
            .s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(StorageError::Transport(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let result = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                Ok(false)
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(StorageError::Transport(e.to_string())),
        }
    }

    async fn head_info(&self, key: &str) -> StorageResult<Option<AssetInfo>> {
        let result = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(AssetInfo {
                size: output.content_length().unwrap_or_default(),
                content_type: output.content_type().map(ToString::to_string),
                last_modified: output
                    .last_modified()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                etag: output.e_tag().map(ToString::to_string),
            })),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                Ok(None)
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(StorageError::Transport(e.to_string())),
        }
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let output = match request.send().await {
                Ok(output) => output,
                Err(SdkError::ServiceError(service_err))
                    if service_err.raw().status().as_u16() >= 500 =>
                {
                    return Err(StorageError::Upstream(format!("{service_err:?}")))
                }
                Err(e) => return Err(StorageError::Transport(e.to_string())),
            };

            for object in output.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(keys)
    }
}
