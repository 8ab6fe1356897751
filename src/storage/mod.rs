//! Object store backends holding the user documents.
//!
//! - `S3ObjectStore` - Amazon S3 (or any S3-compatible endpoint)
//! - `MemoryObjectStore` - process-local map, for tests and local development
//!
//! Every read returns a version token (the S3 ETag) and writes may be made
//! conditional on it, which is what the mutation paths use to detect lost updates.

mod memory;
mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AppConfig, StorageBackend};
use crate::identity::{self, StsIdentityResolver};
use crate::utils::AppError;

/// Object returned by a successful read.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteCondition {
    /// Last writer wins.
    Unconditional,
    /// Only write if the stored version still equals this token.
    IfMatch(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns `None` when no object exists at `key`.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, AppError>;

    /// Writes `body` at `key` and returns the new version token.
    ///
    /// Fails with `AppError::Conflict` when an `IfMatch` condition does not hold.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: WriteCondition,
    ) -> Result<Option<String>, AppError>;

    fn describe(&self) -> String;
}

/// Builds the configured backend. For S3 the bucket comes from `BUCKET_NAME`
/// or, when unset, from the caller's account identity.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn ObjectStore>, AppError> {
    match config.storage_backend {
        StorageBackend::Memory => {
            log::warn!("⚠️  Using in-memory object store - data is lost on restart");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
        StorageBackend::S3 => {
            let sdk_config = load_sdk_config(config).await;

            let bucket = match &config.bucket_name {
                Some(bucket) => bucket.clone(),
                None => {
                    let resolver = StsIdentityResolver::new(&sdk_config);
                    identity::resolve_bucket_name(&resolver, &config.bucket_prefix).await?
                }
            };

            let store = S3ObjectStore::new(&sdk_config, bucket, config.s3_endpoint.as_deref());
            log::info!("🪣 Object store: {}", store.describe());
            Ok(Arc::new(store))
        }
    }
}

async fn load_sdk_config(config: &AppConfig) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await
}
