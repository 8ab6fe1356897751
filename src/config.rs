use std::env;
use std::str::FromStr;

use crate::utils::AppError;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BUCKET_PREFIX: &str = "e-bank-user-data";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageBackend {
    S3,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::ConfigError(format!(
                "STORAGE_BACKEND must be 's3' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Settings shared by the HTTP server and the serverless handler.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub region: String,
    pub storage_backend: StorageBackend,
    /// Explicit bucket; when unset it is derived from the account identity.
    pub bucket_name: Option<String>,
    pub bucket_prefix: String,
    pub s3_endpoint: Option<String>,
    pub max_write_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| AppError::ConfigError(format!("PORT must be a number, got '{}'", port)))?,
            None => DEFAULT_PORT,
        };

        let max_write_attempts = match var("MAX_WRITE_ATTEMPTS") {
            Some(value) => value.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AppError::ConfigError(format!("MAX_WRITE_ATTEMPTS must be a positive number, got '{}'", value))
            })?,
            None => DEFAULT_MAX_WRITE_ATTEMPTS,
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            storage_backend,
            bucket_name: var("BUCKET_NAME"),
            bucket_prefix: var("BUCKET_PREFIX").unwrap_or_else(|| DEFAULT_BUCKET_PREFIX.to_string()),
            s3_endpoint: var("S3_ENDPOINT"),
            max_write_attempts,
        })
    }
}
