use async_trait::async_trait;

use crate::utils::AppError;

/// Resolves the cloud account the process runs as.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn account_id(&self) -> Result<String, AppError>;
}

/// STS `GetCallerIdentity` resolver.
pub struct StsIdentityResolver {
    client: aws_sdk_sts::Client,
}

impl StsIdentityResolver {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn account_id(&self) -> Result<String, AppError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| AppError::IdentityError(format!("GetCallerIdentity failed: {}", e)))?;

        output
            .account()
            .map(|account| account.to_string())
            .ok_or_else(|| AppError::IdentityError("GetCallerIdentity returned no account".to_string()))
    }
}

pub fn bucket_name(prefix: &str, account_id: &str) -> String {
    format!("{}-{}", prefix, account_id)
}

/// Resolves the account once and derives `<prefix>-<account id>`.
pub async fn resolve_bucket_name(
    resolver: &dyn IdentityResolver,
    prefix: &str,
) -> Result<String, AppError> {
    let account_id = resolver.account_id().await?;
    let bucket = bucket_name(prefix, &account_id);
    log::info!("🔑 Resolved account {} -> bucket {}", account_id, bucket);
    Ok(bucket)
}
