use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-Bank User Service API",
        version = "1.0.0",
        description = "One JSON document per user in an object store.\n\n**Operations** (`POST /user`, selected by `mode`):\n- `signup` - store the submitted document\n- `login` - stamp `lastLogin`\n- `transaction` - apply a transaction to an account's balance and monthly statistics\n\n`GET /user?username=` returns the stored document. No authentication."
    ),
    paths(
        // Users
        crate::api::users::get_user,
        crate::api::users::post_user,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Users
            crate::api::users::UserPostRequest,
            crate::models::Transaction,
            crate::api::response::MessageResponse,
            crate::api::response::ErrorResponse,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Users", description = "User document operations: read, signup, login and transactions."),
        (name = "Health", description = "Health check and request counters."),
    )
)]
pub struct ApiDoc;
