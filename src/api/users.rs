use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::{
    api::{
        metrics,
        response::{ApiResponse, ErrorResponse, MessageResponse},
    },
    models::Transaction,
    services::{user_service, UserService},
};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub username: Option<String>,
}

/// Shape of the `POST /user` body, for the OpenAPI document. Signup bodies may carry
/// any extra fields; they are stored verbatim.
#[derive(utoipa::ToSchema)]
pub struct UserPostRequest {
    pub username: String,
    /// `signup`, `login` or `transaction`
    pub mode: String,
    /// signup only
    pub id: Option<String>,
    /// signup only
    pub email: Option<String>,
    /// transaction only
    pub transaction: Option<Transaction>,
}

/// GET /user?username=<name> - documento completo do usuário
#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    params(
        ("username" = String, Query, description = "Username whose document is returned")
    ),
    responses(
        (status = 200, description = "Stored user document"),
        (status = 400, description = "Missing or invalid username", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Unreadable document or store failure", body = ErrorResponse)
    )
)]
pub async fn get_user(
    service: web::Data<UserService>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    metrics::increment_request_count();
    log::info!("📋 GET /user - username: {:?}", query.username);

    ApiResponse::from_result(service.get_user(query.username.as_deref()).await).into_http()
}

/// POST /user - signup, login ou transaction conforme `mode`
#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    request_body = UserPostRequest,
    responses(
        (status = 200, description = "Operation applied", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields, mode or username", body = ErrorResponse),
        (status = 404, description = "User or account not found", body = ErrorResponse),
        (status = 409, description = "Concurrent update, retry", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn post_user(
    service: web::Data<UserService>,
    query: web::Query<UserQuery>,
    body: web::Bytes,
) -> impl Responder {
    metrics::increment_request_count();

    let result = match user_service::parse_body(&body) {
        Ok(body) => {
            log::info!(
                "📝 POST /user - mode: {}",
                body.get("mode").and_then(|m| m.as_str()).unwrap_or("<none>")
            );
            service.handle_post(query.username.as_deref(), &body).await
        }
        Err(e) => Err(e),
    };

    ApiResponse::from_result(result).into_http()
}

/// OPTIONS * - preflight CORS; headers vêm do middleware
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == actix_web::http::Method::OPTIONS {
        return preflight().await;
    }
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api,
        middleware::CorsHeaders,
        services::UserStore,
        storage::MemoryObjectStore,
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn service() -> web::Data<UserService> {
        let store = UserStore::new(Arc::new(MemoryObjectStore::new()));
        web::Data::new(UserService::new(store, 3))
    }

    macro_rules! app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data($service.clone())
                    .wrap(CorsHeaders)
                    .configure(api::configure),
            )
            .await
        };
    }

    fn signup() -> Value {
        json!({
            "username": "bob",
            "mode": "signup",
            "id": "u-2",
            "email": "bob@example.com",
            "accounts": [{ "accountId": "chk", "balance": 500, "transactions": [] }]
        })
    }

    #[actix_web::test]
    async fn test_signup_and_get() {
        let service = service();
        let app = app!(service);

        let req = test::TestRequest::post().uri("/user").set_json(signup()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );

        let req = test::TestRequest::get().uri("/user?username=bob").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, signup());
    }

    #[actix_web::test]
    async fn test_transaction_flow() {
        let service = service();
        let app = app!(service);

        let req = test::TestRequest::post().uri("/user").set_json(signup()).to_request();
        test::call_service(&app, req).await;

        let txn = json!({
            "username": "bob",
            "mode": "transaction",
            "transaction": {
                "accountId": "chk",
                "transactionId": "t-1",
                "amount": 100,
                "type": "deposit",
                "date": "2024-05-02T09:30:00Z"
            }
        });
        let req = test::TestRequest::post().uri("/user").set_json(&txn).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Transaction recorded");

        let req = test::TestRequest::get().uri("/user?username=bob").to_request();
        let user: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(user["accounts"][0]["balance"], json!(600));
        assert_eq!(user["accounts"][0]["monthlyStats"]["2024-05"]["income"], json!(100));
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let service = service();
        let app = app!(service);

        let req = test::TestRequest::get().uri("/user?username=nobody").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/user").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/user")
            .set_json(json!({ "username": "bob", "mode": "wire" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "error": "Invalid mode" }));

        let req = test::TestRequest::post()
            .uri("/user")
            .insert_header(("content-type", "application/json"))
            .set_payload("{broken")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_preflight() {
        let service = service();
        let app = app!(service);

        for uri in ["/user", "/anything/else"] {
            let req = test::TestRequest::default()
                .method(actix_web::http::Method::OPTIONS)
                .uri(uri)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers().get("access-control-allow-methods").unwrap(),
                "OPTIONS,POST,GET"
            );
            assert_eq!(
                resp.headers().get("access-control-allow-headers").unwrap(),
                "Content-Type"
            );
            let body = test::read_body(resp).await;
            assert!(body.is_empty());
        }
    }
}
