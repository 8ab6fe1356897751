//! Serverless entry point: API Gateway proxy events in, proxy responses out.
//!
//! Shares the router with the HTTP server; only the envelope differs.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    api::{metrics, response::{ApiResponse, CORS_HEADERS}},
    services::{user_service, UserService},
    utils::AppError,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    pub http_method: String,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// JSON text, or empty for preflight.
    pub body: String,
}

impl ProxyResponse {
    fn new(status_code: u16, body: String) -> Self {
        let headers = CORS_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self {
            status_code,
            headers,
            body,
        }
    }
}

impl From<ApiResponse> for ProxyResponse {
    fn from(response: ApiResponse) -> Self {
        ProxyResponse::new(response.status, response.body.to_string())
    }
}

pub async fn handle_event(service: &UserService, event: ProxyEvent) -> ProxyResponse {
    let method = event.http_method.to_ascii_uppercase();
    if method == "OPTIONS" {
        return ProxyResponse::new(200, String::new());
    }

    metrics::increment_request_count();
    log::info!("📨 {} event", method);

    let query_username = event
        .query_string_parameters
        .as_ref()
        .and_then(|params| params.get("username"))
        .map(String::as_str);

    let body = match decode_body(&event) {
        Ok(body) => body,
        Err(e) => return ApiResponse::from_error(&e).into(),
    };

    let result = match method.as_str() {
        "GET" => {
            // GET falls back to the body's username, as the query string is optional here
            let username = query_username.or_else(|| body.get("username").and_then(|u| u.as_str()));
            service.get_user(username).await
        }
        "POST" => service.handle_post(query_username, &body).await,
        _ => return ApiResponse::method_not_allowed().into(),
    };

    ApiResponse::from_result(result).into()
}

fn decode_body(event: &ProxyEvent) -> Result<serde_json::Value, AppError> {
    let raw = event.body.as_deref().unwrap_or("");

    if event.is_base64_encoded {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(raw)
            .map_err(|_| AppError::InvalidRequest("Invalid JSON body".to_string()))?;
        user_service::parse_body(&bytes)
    } else {
        user_service::parse_body(raw.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::UserStore, storage::MemoryObjectStore};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn service() -> UserService {
        UserService::new(UserStore::new(Arc::new(MemoryObjectStore::new())), 3)
    }

    fn post(body: Value) -> ProxyEvent {
        ProxyEvent {
            http_method: "POST".to_string(),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    fn get(username: &str) -> ProxyEvent {
        ProxyEvent {
            http_method: "GET".to_string(),
            query_string_parameters: Some(HashMap::from([("username".to_string(), username.to_string())])),
            ..Default::default()
        }
    }

    fn body_of(response: &ProxyResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let response = handle_event(&service(), ProxyEvent {
            http_method: "OPTIONS".to_string(),
            ..Default::default()
        })
        .await;

        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "OPTIONS,POST,GET");
        assert_eq!(response.headers["Access-Control-Allow-Headers"], "Content-Type");
    }

    #[tokio::test]
    async fn test_signup_login_get() {
        let service = service();
        let signup = json!({ "username": "carol", "mode": "signup", "id": 3, "email": "carol@example.com" });

        let response = handle_event(&service, post(signup.clone())).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(body_of(&response)["key"], "users/carol.json");

        let response = handle_event(&service, post(json!({ "username": "carol", "mode": "login" }))).await;
        assert_eq!(response.status_code, 200);

        let response = handle_event(&service, get("carol")).await;
        assert_eq!(response.status_code, 200);
        let user = body_of(&response);
        assert_eq!(user["email"], "carol@example.com");
        assert!(user["lastLogin"].is_string());
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_base64_body() {
        let service = service();
        let signup = json!({ "username": "dave", "mode": "signup", "id": "u-4", "email": "d@example.com" });
        let event = ProxyEvent {
            http_method: "POST".to_string(),
            body: Some(base64::engine::general_purpose::STANDARD.encode(signup.to_string())),
            is_base64_encoded: true,
            ..Default::default()
        };

        assert_eq!(handle_event(&service, event).await.status_code, 200);
        assert_eq!(body_of(&handle_event(&service, get("dave")).await), signup);
    }

    #[tokio::test]
    async fn test_error_envelopes() {
        let service = service();

        let response = handle_event(&service, post(json!({ "mode": "login" }))).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(body_of(&response), json!({ "error": "Missing 'username'" }));

        let response = handle_event(&service, get("nobody")).await;
        assert_eq!(response.status_code, 404);

        let response = handle_event(&service, ProxyEvent {
            http_method: "POST".to_string(),
            body: Some("{not json".to_string()),
            ..Default::default()
        })
        .await;
        assert_eq!(response.status_code, 400);

        let response = handle_event(&service, ProxyEvent {
            http_method: "DELETE".to_string(),
            ..Default::default()
        })
        .await;
        assert_eq!(response.status_code, 405);
    }

    #[tokio::test]
    async fn test_deserializes_gateway_event() {
        let event: ProxyEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/user",
            "queryStringParameters": { "username": "erin" },
            "headers": { "Accept": "application/json" },
            "body": null,
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(event.http_method, "GET");
        assert_eq!(event.query_string_parameters.unwrap()["username"], "erin");
        assert!(event.body.is_none());
    }

    #[test]
    fn test_response_serializes_with_gateway_names() {
        let response: ProxyResponse = ApiResponse::ok(json!({ "message": "ok" })).into();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], r#"{"message":"ok"}"#);
        assert_eq!(value["headers"]["Access-Control-Allow-Headers"], "Content-Type");
    }
}
