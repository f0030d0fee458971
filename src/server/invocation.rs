use std::sync::Arc;

use axum::{Router, body::Body, extract::Request, response::Response};
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::server::{EdgeApplicationServer, services::EdgeServices};

/// single invocation deployment: no socket, the host runtime hands over one request at a time.
/// same router as the listener, only origin keep-alive is left to the transport
#[derive(Clone)]
pub struct InvocationHandler {
    router: Router,
}

impl InvocationHandler {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let services = EdgeServices::new(config, false)?;
        Ok(Self::from_services(services))
    }

    pub fn from_services(services: EdgeServices) -> Self {
        Self {
            router: EdgeApplicationServer::router(services),
        }
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
