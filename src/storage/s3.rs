use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use super::{ObjectStore, StoredObject, WriteCondition};
use crate::utils::AppError;

/// S3-backed object store bound to a single bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Creates the store from a loaded SDK config. A custom `endpoint` switches to
    /// path-style addressing, which MinIO and most S3-compatible services require.
    pub fn new(sdk_config: &aws_config::SdkConfig, bucket: impl Into<String>, endpoint: Option<&str>) -> Self {
        let client = match endpoint {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(sdk_config),
        };

        Self::with_client(client, bucket)
    }

    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(AppError::StorageError(format!(
                    "S3 get s3://{}/{} failed: {}",
                    self.bucket, key, service_error
                )));
            }
        };

        let version = response.e_tag().map(|etag| etag.to_string());

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::StorageError(format!("S3 body read failed: {}", e)))?
            .into_bytes()
            .to_vec();

        log::debug!("📥 Read s3://{}/{} ({} bytes)", self.bucket, key, body.len());

        Ok(Some(StoredObject { body, version }))
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: WriteCondition,
    ) -> Result<Option<String>, AppError> {
        let size = body.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body));

        if let WriteCondition::IfMatch(etag) = &condition {
            request = request.if_match(etag);
        }

        let response = request.send().await.map_err(|e| {
            let status = e.raw_response().map(|r| r.status().as_u16());
            // 412: ETag no longer matches; 409: a concurrent conditional write is in flight
            if matches!(status, Some(412) | Some(409)) {
                AppError::Conflict(format!("s3://{}/{} was modified concurrently", self.bucket, key))
            } else {
                AppError::StorageError(format!("S3 put s3://{}/{} failed: {}", self.bucket, key, e))
            }
        })?;

        log::debug!("📤 Wrote s3://{}/{} ({} bytes, {:?})", self.bucket, key, size, condition);

        Ok(response.e_tag().map(|etag| etag.to_string()))
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
