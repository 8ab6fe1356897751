pub mod health;
pub mod metrics;
pub mod response;
pub mod swagger;
pub mod users;

use actix_web::{http::Method, web};

/// Routes shared by the server binary and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        // User documents
        .service(
            web::resource("/user")
                .route(web::get().to(users::get_user))
                .route(web::post().to(users::post_user))
                .route(web::method(Method::OPTIONS).to(users::preflight)),
        )
        .default_service(web::to(users::fallback));
}
