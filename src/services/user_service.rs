// ==================== USER OPERATIONS ====================
// signup / login / transaction sobre o documento do usuário
// Mutações usam escrita condicional (ETag) com novas tentativas em caso de conflito

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::{
    config::AppConfig,
    models::{validate_username, Transaction, UserDocument},
    services::user_store::UserStore,
    storage,
    utils::AppError,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Signup,
    Login,
    Transaction,
}

impl Mode {
    pub fn parse(mode: &str) -> Result<Self, AppError> {
        match mode {
            "signup" => Ok(Mode::Signup),
            "login" => Ok(Mode::Login),
            "transaction" => Ok(Mode::Transaction),
            _ => Err(AppError::InvalidRequest("Invalid mode".to_string())),
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    store: UserStore,
    max_write_attempts: u32,
}

impl UserService {
    pub fn new(store: UserStore, max_write_attempts: u32) -> Self {
        Self {
            store,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    /// Connects the configured object store and wires the service on top of it.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let backend = storage::connect(config).await?;
        Ok(Self::new(UserStore::new(backend), config.max_write_attempts))
    }

    pub fn storage(&self) -> String {
        self.store.describe()
    }

    /// GET - returns the stored document as-is.
    pub async fn get_user(&self, username: Option<&str>) -> Result<Value, AppError> {
        let username = require_username(username)?;
        let user = self.store.fetch_raw(username).await?;
        log::info!("✅ Fetched user {}", username);
        Ok(user)
    }

    /// POST - dispatches on `mode`. The query string's username wins over the body's.
    pub async fn handle_post(&self, query_username: Option<&str>, body: &Value) -> Result<Value, AppError> {
        let username = query_username
            .filter(|username| !username.is_empty())
            .or_else(|| body.get("username").and_then(Value::as_str));
        let username = require_username(username)?;

        let mode = body
            .get("mode")
            .and_then(Value::as_str)
            .filter(|mode| !mode.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("Missing 'mode'".to_string()))?;

        match Mode::parse(mode)? {
            Mode::Signup => self.signup(username, body).await,
            Mode::Login => self.login(username).await,
            Mode::Transaction => self.record_transaction(username, body.get("transaction")).await,
        }
    }

    pub async fn signup(&self, username: &str, payload: &Value) -> Result<Value, AppError> {
        let has_id = payload.get("id").map(is_present).unwrap_or(false);
        let has_email = payload.get("email").map(is_present).unwrap_or(false);
        if !has_id || !has_email {
            return Err(AppError::InvalidRequest(
                "Missing required fields for signup: id and email".to_string(),
            ));
        }

        let key = self.store.create(username, payload).await?;
        log::info!("✅ User {} signed up ({})", username, key);

        Ok(json!({ "message": "User signed up and saved", "key": key }))
    }

    pub async fn login(&self, username: &str) -> Result<Value, AppError> {
        self.update_document(username, |document| {
            document.set_last_login(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
        })
        .await?;

        log::info!("✅ lastLogin updated for {}", username);
        Ok(json!({ "message": "lastLogin updated", "username": username }))
    }

    pub async fn record_transaction(&self, username: &str, raw: Option<&Value>) -> Result<Value, AppError> {
        let transaction = Transaction::from_request(raw)?;
        let period = transaction.period()?;
        let record = raw.cloned().unwrap_or(Value::Null);

        self.update_document(username, |document| {
            document
                .account_mut(&transaction.account_id)
                .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?
                .apply(&transaction, &period, record.clone())
        })
        .await?;

        log::info!(
            "✅ Transaction {} recorded on {}/{} ({} {})",
            transaction.transaction_id,
            username,
            transaction.account_id,
            transaction.kind,
            transaction.amount
        );
        Ok(json!({ "message": "Transaction recorded", "transaction": record }))
    }

    /// Fetch, mutate, conditionally write back; re-read and retry on conflict.
    /// An error from `mutate` aborts without writing.
    async fn update_document<F>(&self, username: &str, mut mutate: F) -> Result<(), AppError>
    where
        F: FnMut(&mut UserDocument) -> Result<(), AppError>,
    {
        let mut attempt = 1;
        loop {
            let mut current = self.store.fetch(username).await?;
            mutate(&mut current.document)?;

            match self
                .store
                .replace_if(username, &current.document, current.version.as_deref())
                .await
            {
                Err(AppError::Conflict(msg)) if attempt < self.max_write_attempts => {
                    log::warn!(
                        "🔁 Write conflict for {} (attempt {}/{}): {}",
                        username,
                        attempt,
                        self.max_write_attempts,
                        msg
                    );
                    attempt += 1;
                }
                Err(AppError::Conflict(_)) => {
                    return Err(AppError::Conflict(
                        "Concurrent update detected, please retry".to_string(),
                    ));
                }
                other => return other,
            }
        }
    }
}

fn require_username(username: Option<&str>) -> Result<&str, AppError> {
    let username = username
        .filter(|username| !username.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing 'username'".to_string()))?;
    validate_username(username)?;
    Ok(username)
}

/// Mirrors a truthiness check: null, false, "" and 0 count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parses a request body; an empty body is treated as `{}`.
pub fn parse_body(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| AppError::InvalidRequest("Invalid JSON body".to_string()))
}
