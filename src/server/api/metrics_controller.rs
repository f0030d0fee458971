use axum::Extension;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::server::services::EdgeServices;

/// prometheus text exposition, only routed when metrics are enabled
pub async fn metrics_endpoint(Extension(services): Extension<EdgeServices>) -> Response {
    match &services.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
