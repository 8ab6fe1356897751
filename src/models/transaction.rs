use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::utils::AppError;

/// Transaction types that credit the account; everything else is a debit.
pub const CREDIT_TYPES: [&str; 2] = ["receive", "deposit"];

pub const INVALID_TRANSACTION: &str = "Missing or invalid transaction data";

/// Client-supplied transaction, validated before it touches a document.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(deserialize_with = "deserialize_id")]
    pub account_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub transaction_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
}

impl Transaction {
    /// Parses and validates the `transaction` object of a request body.
    pub fn from_request(raw: Option<&Value>) -> Result<Self, AppError> {
        let raw = raw.ok_or_else(|| AppError::InvalidRequest(INVALID_TRANSACTION.to_string()))?;

        let transaction: Transaction = serde_json::from_value(raw.clone())
            .map_err(|_| AppError::InvalidRequest(INVALID_TRANSACTION.to_string()))?;

        let blank = [
            &transaction.account_id,
            &transaction.transaction_id,
            &transaction.kind,
            &transaction.date,
        ]
        .iter()
        .any(|field| field.trim().is_empty());

        if blank {
            return Err(AppError::InvalidRequest(INVALID_TRANSACTION.to_string()));
        }

        Ok(transaction)
    }

    pub fn is_credit(&self) -> bool {
        CREDIT_TYPES.contains(&self.kind.as_str())
    }

    pub fn signed_amount(&self) -> f64 {
        if self.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }

    /// `YYYY-MM` bucket for monthly statistics, computed in UTC.
    pub fn period(&self) -> Result<String, AppError> {
        parse_date(&self.date)
            .map(|date| date.format("%Y-%m").to_string())
            .ok_or_else(|| AppError::InvalidRequest(format!("Invalid transaction date: {}", self.date)))
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    // zero counts as a missing id, like an empty string
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => Err(serde::de::Error::custom("Id must not be zero")),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("Expected string or number")),
    }
}
