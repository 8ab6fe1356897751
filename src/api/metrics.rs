use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static CLIENT_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static SERVER_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static CONFLICT_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Counts a non-2xx response by class; 409s are also counted separately.
pub fn record_error_status(status: u16) {
    if status >= 500 {
        SERVER_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
    } else if status >= 400 {
        CLIENT_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        if status == 409 {
            CONFLICT_COUNT.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_client_errors_total: u64,
    pub http_server_errors_total: u64,
    pub write_conflicts_total: u64,
}

pub fn snapshot() -> MetricsResponse {
    MetricsResponse {
        http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
        http_client_errors_total: CLIENT_ERROR_COUNT.load(Ordering::Relaxed),
        http_server_errors_total: SERVER_ERROR_COUNT.load(Ordering::Relaxed),
        write_conflicts_total: CONFLICT_COUNT.load(Ordering::Relaxed),
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text exposition of request counters")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    let m = snapshot();

    let metrics = format!(
        "# HELP http_requests_total Total number of /user requests\n\
         # TYPE http_requests_total counter\n\
         http_requests_total {}\n\
         \n\
         # HELP http_errors_total Total number of error responses by class\n\
         # TYPE http_errors_total counter\n\
         http_errors_total{{class=\"4xx\"}} {}\n\
         http_errors_total{{class=\"5xx\"}} {}\n\
         \n\
         # HELP write_conflicts_total Mutations abandoned after repeated write conflicts\n\
         # TYPE write_conflicts_total counter\n\
         write_conflicts_total {}\n",
        m.http_requests_total, m.http_client_errors_total, m.http_server_errors_total, m.write_conflicts_total
    );

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics)
}
