use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;

use crate::logger::environment_name;
use crate::server::dtos::health_dto::{HealthResponse, HealthStatus, RelayDetails};
use crate::server::services::EdgeServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// liveness only, the relay has no backing store and never contacts origins from here
pub async fn health_endpoint(
    Extension(services): Extension<EdgeServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let config = &services.config;

    let response = HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: environment_name(config.cargo_env).to_string(),
        relay: RelayDetails {
            target_mode: format!("{:?}", config.target_mode).to_lowercase(),
            content_type_policy: format!("{:?}", config.content_type_policy).to_lowercase(),
            insecure_upstream_tls: config.insecure_upstream_tls,
            forward_request_headers: config.forward_request_headers,
        },
    };

    (StatusCode::OK, Json(response))
}
