use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::Transaction;
use crate::utils::{add_amount, AppError};

const MAX_USERNAME_LEN: usize = 128;

/// Stored document - one per user at `users/<username>.json`.
///
/// Held as the JSON tree that was read. Mutations touch only the fields they
/// own; everything else is written back as it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserDocument(Value);

impl From<Value> for UserDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl UserDocument {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn set_last_login(&mut self, timestamp: String) -> Result<(), AppError> {
        let fields = self
            .0
            .as_object_mut()
            .ok_or_else(|| AppError::MalformedDocument("user document is not a JSON object".to_string()))?;
        fields.insert("lastLogin".to_string(), Value::String(timestamp));
        Ok(())
    }

    /// First entry of `accounts` whose `accountId` matches. Entries that are not
    /// objects, or have no `accountId`, never match.
    pub fn account_mut(&mut self, account_id: &str) -> Option<AccountEntry<'_>> {
        self.0
            .get_mut("accounts")?
            .as_array_mut()?
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|fields| fields.get("accountId").is_some_and(|id| id_matches(id, account_id)))
            .map(|fields| AccountEntry { fields })
    }
}

fn id_matches(id: &Value, account_id: &str) -> bool {
    match id {
        Value::String(s) => s == account_id,
        Value::Number(n) => n.to_string() == account_id,
        _ => false,
    }
}

/// Borrowed view of one account inside a [`UserDocument`].
pub struct AccountEntry<'a> {
    fields: &'a mut Map<String, Value>,
}

impl AccountEntry<'_> {
    /// Applies the balance delta, appends the submitted record and bumps the
    /// statistics bucket for the transaction's month.
    ///
    /// Absent (or null) `balance`, `transactions`, `monthlyStats` and bucket
    /// fields start from zero or empty. A present field of the wrong type is a
    /// `MalformedDocument`. Other keys of the account are left alone.
    pub fn apply(&mut self, transaction: &Transaction, period: &str, record: Value) -> Result<(), AppError> {
        let balance = add_amount(self.fields.get("balance"), transaction.signed_amount())
            .map_err(|e| malformed("balance", e))?;
        self.fields.insert("balance".to_string(), balance);

        let records = self.fields.entry("transactions").or_insert(Value::Null);
        if records.is_null() {
            *records = Value::Array(Vec::new());
        }
        records
            .as_array_mut()
            .ok_or_else(|| malformed("transactions", "not an array"))?
            .push(record);

        let stats = object_slot(self.fields, "monthlyStats")?;
        let bucket = object_slot(stats, period)?;
        for key in ["income", "spend"] {
            bucket.entry(key).or_insert_with(|| Value::from(0));
        }

        let key = if transaction.is_credit() { "income" } else { "spend" };
        let total = add_amount(bucket.get(key), transaction.amount)
            .map_err(|e| malformed(&format!("monthlyStats.{}.{}", period, key), e))?;
        bucket.insert(key.to_string(), total);
        Ok(())
    }
}

/// Object stored under `key`, created empty when absent or null.
fn object_slot<'m>(fields: &'m mut Map<String, Value>, key: &str) -> Result<&'m mut Map<String, Value>, AppError> {
    let slot = fields.entry(key).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut().ok_or_else(|| malformed(key, "not an object"))
}

fn malformed(field: &str, reason: impl std::fmt::Display) -> AppError {
    AppError::MalformedDocument(format!("account field '{}': {}", field, reason))
}

/// Usernames become part of the object key, so only a safe character set is accepted.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && !username.starts_with('.')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'));

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!("Invalid 'username': {:?}", username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transaction(kind: &str, amount: f64) -> Transaction {
        serde_json::from_value(json!({
            "accountId": "acc-1",
            "transactionId": "t-1",
            "amount": amount,
            "type": kind,
            "date": "2024-03-15"
        }))
        .unwrap()
    }

    #[test]
    fn test_document_round_trips_verbatim() {
        let raw = json!({
            "id": 7,
            "email": { "primary": "ana@example.com" },
            "username": "ana",
            "lastLogin": 1700000000,
            "accounts": [
                { "accountId": "acc-1", "balance": 12345678901234567890u64, "nickname": "main" },
                { "balance": "500" }
            ]
        });

        let doc: UserDocument = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), raw);
    }

    #[test]
    fn test_set_last_login_touches_only_last_login() {
        let mut doc = UserDocument::from(json!({ "accounts": null, "lastLogin": false }));
        doc.set_last_login("2024-03-15T10:00:00.000Z".to_string()).unwrap();
        assert_eq!(
            doc.into_value(),
            json!({ "accounts": null, "lastLogin": "2024-03-15T10:00:00.000Z" })
        );

        let mut not_an_object = UserDocument::from(json!(["alice"]));
        assert!(matches!(
            not_an_object.set_last_login("now".to_string()),
            Err(AppError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_account_lookup() {
        let mut doc = UserDocument::from(json!({
            "accounts": [{ "balance": 1 }, "junk", { "accountId": 42, "balance": 1 }]
        }));
        assert!(doc.account_mut("42").is_some());
        assert!(doc.account_mut("43").is_none());

        assert!(UserDocument::from(json!({})).account_mut("acc-1").is_none());
        assert!(UserDocument::from(json!({ "accounts": null })).account_mut("acc-1").is_none());
    }

    #[test]
    fn test_apply_creates_missing_fields() {
        let mut doc = UserDocument::from(json!({ "accounts": [{ "accountId": "acc-1" }] }));
        let mut account = doc.account_mut("acc-1").unwrap();
        account.apply(&transaction("deposit", 100.0), "2024-03", json!({ "transactionId": "t-1" })).unwrap();
        account.apply(&transaction("withdrawal", 25.5), "2024-03", json!({ "transactionId": "t-2" })).unwrap();

        assert_eq!(
            doc.into_value(),
            json!({ "accounts": [{
                "accountId": "acc-1",
                "balance": 74.5,
                "transactions": [{ "transactionId": "t-1" }, { "transactionId": "t-2" }],
                "monthlyStats": { "2024-03": { "income": 100, "spend": 25.5 } }
            }] })
        );
    }

    #[test]
    fn test_apply_keeps_unknown_bucket_keys() {
        let mut doc = UserDocument::from(json!({ "accounts": [{
            "accountId": "acc-1",
            "balance": 10,
            "transactions": [],
            "monthlyStats": { "2024-03": { "income": 5, "note": "bonus" }, "2024-02": { "spend": 1 } }
        }] }));

        doc.account_mut("acc-1")
            .unwrap()
            .apply(&transaction("deposit", 1.0), "2024-03", json!({}))
            .unwrap();

        let stats = &doc.as_value()["accounts"][0]["monthlyStats"];
        assert_eq!(stats["2024-03"], json!({ "income": 6, "spend": 0, "note": "bonus" }));
        assert_eq!(stats["2024-02"], json!({ "spend": 1 }));
    }

    #[test]
    fn test_apply_rejects_mistyped_fields() {
        for account in [
            json!({ "accountId": "acc-1", "balance": "500" }),
            json!({ "accountId": "acc-1", "transactions": {} }),
            json!({ "accountId": "acc-1", "monthlyStats": [] }),
            json!({ "accountId": "acc-1", "monthlyStats": { "2024-03": { "income": "x" } } }),
        ] {
            let mut doc = UserDocument::from(json!({ "accounts": [account] }));
            let result = doc
                .account_mut("acc-1")
                .unwrap()
                .apply(&transaction("deposit", 1.0), "2024-03", json!({}));
            assert!(matches!(result, Err(AppError::MalformedDocument(_))));
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ana.silva_01@bank-demo").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("../admin").is_err());
        assert!(validate_username(".hidden").is_err());
        assert!(validate_username("a/b").is_err());
        assert!(validate_username("tab\tname").is_err());
        assert!(validate_username(&"x".repeat(129)).is_err());
    }
}
