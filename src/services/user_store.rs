// ==================== USER DOCUMENT STORE ====================
// Um documento JSON por usuário em users/<username>.json

use serde_json::Value;
use std::sync::Arc;

use crate::{
    models::UserDocument,
    storage::{ObjectStore, WriteCondition},
    utils::AppError,
};

const KEY_PREFIX: &str = "users/";

/// Document together with the version token it was read at.
#[derive(Debug, Clone)]
pub struct VersionedDocument {
    pub document: UserDocument,
    pub version: Option<String>,
}

#[derive(Clone)]
pub struct UserStore {
    backend: Arc<dyn ObjectStore>,
}

/// Object key for a (validated) username.
pub fn user_key(username: &str) -> String {
    format!("{}{}.json", KEY_PREFIX, username)
}

impl UserStore {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self { backend }
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Stored JSON exactly as written, without interpreting it as a user document.
    pub async fn fetch_raw(&self, username: &str) -> Result<Value, AppError> {
        let key = user_key(username);
        let object = self
            .backend
            .get(&key)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        serde_json::from_slice(&object.body)
            .map_err(|e| AppError::MalformedDocument(format!("{}: {}", key, e)))
    }

    pub async fn fetch(&self, username: &str) -> Result<VersionedDocument, AppError> {
        let key = user_key(username);
        let object = self
            .backend
            .get(&key)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let document = serde_json::from_slice(&object.body)
            .map_err(|e| AppError::MalformedDocument(format!("{}: {}", key, e)))?;

        Ok(VersionedDocument {
            document,
            version: object.version,
        })
    }

    /// Writes the signup payload verbatim. An existing document is overwritten.
    pub async fn create(&self, username: &str, payload: &Value) -> Result<String, AppError> {
        let key = user_key(username);
        self.write(&key, payload, WriteCondition::Unconditional).await?;
        Ok(key)
    }

    /// Unconditional rewrite; concurrent writers silently lose updates.
    pub async fn replace(&self, username: &str, document: &UserDocument) -> Result<(), AppError> {
        self.write(&user_key(username), document, WriteCondition::Unconditional)
            .await
    }

    /// Rewrites only if the stored object is still at `version`.
    pub async fn replace_if(
        &self,
        username: &str,
        document: &UserDocument,
        version: Option<&str>,
    ) -> Result<(), AppError> {
        let key = user_key(username);
        let condition = match version {
            Some(version) => WriteCondition::IfMatch(version.to_string()),
            None => {
                log::warn!("⚠️  No version token for {}, writing unconditionally", key);
                WriteCondition::Unconditional
            }
        };
        self.write(&key, document, condition).await
    }

    async fn write<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        condition: WriteCondition,
    ) -> Result<(), AppError> {
        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::StorageError(format!("Failed to serialize {}: {}", key, e)))?;
        self.backend.put(key, body, condition).await?;
        Ok(())
    }
}
