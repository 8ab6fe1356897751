use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::metrics;
use crate::utils::AppError;

/// Headers attached to every response, preflight included.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "OPTIONS,POST,GET"),
];

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Present on 500s; matches the server-side log line carrying the full error.
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Status plus JSON body, shared by the HTTP server and the serverless handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// Client errors carry their message; internal errors only carry a
    /// correlation id, the detail goes to the log.
    pub fn from_error(err: &AppError) -> Self {
        let status = err.status_code();
        metrics::record_error_status(status);

        let body = if err.is_internal() {
            let correlation_id = Uuid::new_v4().to_string();
            log::error!("❌ [{}] {}", correlation_id, err);
            ErrorResponse {
                error: "Internal Server Error".to_string(),
                correlation_id: Some(correlation_id),
            }
        } else {
            log::warn!("⚠️  {} {}", status, err);
            ErrorResponse {
                error: err.to_string(),
                correlation_id: None,
            }
        };

        Self {
            status,
            body: serde_json::to_value(body).unwrap_or_else(|_| json!({ "error": "Internal Server Error" })),
        }
    }

    pub fn from_result(result: Result<Value, AppError>) -> Self {
        match result {
            Ok(body) => Self::ok(body),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            body: json!({ "error": "Method not allowed" }),
        }
    }

    pub fn into_http(self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self.body)
    }
}
