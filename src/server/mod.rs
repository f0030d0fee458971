pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod invocation;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{Extension, Router, middleware, response::Response, routing::get};
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::server::utils::header_utils::apply_cors_headers;
use api::{
    health_controller::health_endpoint, metrics_controller::metrics_endpoint,
    proxy_controller::ProxyController,
};
use services::EdgeServices;

pub use invocation::InvocationHandler;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// the long running deployment, one tokio listener relaying until ctrl-c
pub struct EdgeApplicationServer;

impl EdgeApplicationServer {
    /// shared by both deployment shapes so they answer identically
    pub fn router(services: EdgeServices) -> Router {
        Lazy::force(&STARTED_AT);

        let mut router = Router::new().route("/health", get(health_endpoint));

        if services.metrics.is_some() {
            router = router.route("/metrics", get(metrics_endpoint));
        }

        router
            .merge(ProxyController::app(services.config.target_mode))
            .layer(middleware::map_response(with_cors))
            .layer(Extension(services))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(config: Arc<AppConfig>) -> anyhow::Result<()> {
        let services = EdgeServices::new(config.clone(), true)?;

        let listener = TcpListener::bind((config.bind_address.as_str(), config.port))
            .await
            .with_context(|| format!("failed to bind {}:{}", config.bind_address, config.port))?;

        Self::serve_with_listener(listener, services).await
    }

    /// serve on an already bound listener, lets callers pick an ephemeral port
    pub async fn serve_with_listener(
        listener: TcpListener,
        services: EdgeServices,
    ) -> anyhow::Result<()> {
        info!(
            "relay listening on {}",
            listener.local_addr().context("listener has no local address")?
        );

        axum::serve(listener, Self::router(services))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("relay server stopped unexpectedly")?;

        info!("relay stopped");
        Ok(())
    }
}

// health and metrics get the same cors set as relayed responses
async fn with_cors(mut response: Response) -> Response {
    apply_cors_headers(response.headers_mut());
    response
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received, draining open relays"),
        Err(e) => {
            // without a signal handler there is nothing to wait on, keep serving
            warn!("could not listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
