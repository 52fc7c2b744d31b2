use axum::Json;
use axum::http::header;
use axum::response::IntoResponse;
use lovebird_derive::{api_handler, api_model};
use lovebird_domain::constants::SYSTEM_TAG;
use std::sync::OnceLock;
use std::time::Instant;

static STARTED: OnceLock<Instant> = OnceLock::new();

#[api_model]
/// Liveness response
struct HealthResponse {
    /// `up` while the process serves requests
    status: &'static str,
    /// Server version
    version: &'static str,
    /// Seconds since the first health request
    uptime: u64,
}

impl HealthResponse {
    fn now() -> Self {
        let uptime = STARTED.get_or_init(Instant::now).elapsed().as_secs();
        Self { status: "up", version: env!("CARGO_PKG_VERSION"), uptime }
    }
}

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Liveness probe", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-store")], Json(HealthResponse::now()))
}
