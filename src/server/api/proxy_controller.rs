use axum::{
    Extension, Router,
    body::Body,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{MethodRouter, options},
};
use tracing::debug;

use crate::config::TargetMode;
use crate::server::{
    error::{AppResult, Error},
    extractors::RelayTarget,
    services::{EdgeServices, relay_services::RelayRequest},
    utils::header_utils::preflight_headers,
};

pub struct ProxyController;

impl ProxyController {
    pub fn app(target_mode: TargetMode) -> Router {
        match target_mode {
            TargetMode::Query => Router::new()
                .route("/", Self::relay_route())
                .route("/proxy", Self::relay_route())
                .fallback(Self::not_routed),
            // the whole path is the target, so nothing else can be routed under it
            TargetMode::Path => Router::new().fallback_service(Self::relay_route()),
        }
    }

    // preflight is answered here, every other method goes to the relay
    fn relay_route() -> MethodRouter {
        options(Self::proxy_options).fallback(Self::proxy)
    }

    async fn proxy(
        target: RelayTarget,
        Extension(services): Extension<EdgeServices>,
        method: Method,
        headers: HeaderMap,
        body: Body,
    ) -> AppResult<Response> {
        debug!("Relaying {} {}", method, target.url);

        let response = services
            .relay
            .relay(RelayRequest {
                method,
                target: target.url,
                is_segment: target.is_segment,
                headers,
                body: Some(body),
            })
            .await?;

        metrics::counter!("relay_requests_total", "outcome" => "relayed").increment(1);

        Ok(response)
    }

    // a typo'd path from a browser player still needs cors to surface the 404
    async fn not_routed() -> Error {
        Error::NotFound
    }

    // never reaches the origin, a browser only wants to know it may send Range
    async fn proxy_options() -> impl IntoResponse {
        metrics::counter!("relay_requests_total", "outcome" => "preflight").increment(1);
        (StatusCode::NO_CONTENT, preflight_headers())
    }
}
