use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderMap, Method},
    response::Response,
};
use futures::TryStreamExt;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::{AppConfig, ContentTypePolicy};
use crate::server::{
    error::{AppResult, Error},
    utils::header_utils::{UpstreamHeaderOptions, build_response_headers, build_upstream_headers},
};

/// everything one relay needs, built per inbound request and dropped with the response
pub struct RelayRequest {
    pub method: Method,
    pub target: Url,
    pub is_segment: bool,
    pub headers: HeaderMap,
    /// only sent upstream in bidirectional mode
    pub body: Option<Body>,
}

pub type DynRelayService = Arc<dyn RelayServiceTrait + Send + Sync>;

#[async_trait::async_trait]
pub trait RelayServiceTrait {
    /// issue the upstream request and hand back a streaming client response
    async fn relay(&self, request: RelayRequest) -> AppResult<Response>;
}

#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub user_agent: String,
    pub keep_alive: bool,
    pub forward_request_headers: bool,
    pub content_type_policy: ContentTypePolicy,
    pub upstream_timeout: Option<Duration>,
}

impl RelayOptions {
    /// `keep_alive` is true for the listener, a single invocation never reuses a connection
    pub fn from_config(config: &AppConfig, keep_alive: bool) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            keep_alive,
            forward_request_headers: config.forward_request_headers,
            content_type_policy: config.content_type_policy,
            upstream_timeout: config.upstream_timeout(),
        }
    }
}

pub struct RelayService {
    http: reqwest::Client,
    options: RelayOptions,
}

impl RelayService {
    pub fn new(http: reqwest::Client, options: RelayOptions) -> Self {
        Self { http, options }
    }

    /// one pooled client per process. no total timeout here, it would cut live bodies short
    pub fn build_client(config: &AppConfig) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .no_proxy();

        if let Some(proxy) = &config.upstream_proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        if config.insecure_upstream_tls {
            warn!(
                "upstream certificate verification is DISABLED, relayed streams can be read or altered in transit"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build()
    }

    fn carries_body(method: &Method) -> bool {
        !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

// reqwest's display stops at "error sending request", the cause is further down the chain
fn describe_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait::async_trait]
impl RelayServiceTrait for RelayService {
    async fn relay(&self, request: RelayRequest) -> AppResult<Response> {
        let RelayRequest {
            method,
            target,
            is_segment,
            headers,
            body,
        } = request;

        let upstream_headers = build_upstream_headers(
            &headers,
            is_segment,
            &UpstreamHeaderOptions {
                user_agent: &self.options.user_agent,
                keep_alive: self.options.keep_alive,
                forward_inbound: self.options.forward_request_headers,
            },
        );

        let mut request_builder = self
            .http
            .request(method.clone(), target.clone())
            .headers(upstream_headers);

        if self.options.forward_request_headers && Self::carries_body(&method) {
            if let Some(body) = body {
                request_builder =
                    request_builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
            }
        }

        debug!(
            "Sending {} to {} (segment: {})",
            method, target, is_segment
        );

        let started = Instant::now();
        let sent = match self.options.upstream_timeout {
            Some(limit) => tokio::time::timeout(limit, request_builder.send())
                .await
                .map_err(|_| {
                    error!("Upstream {} did not answer within {:?}", target, limit);
                    Error::UpstreamTimeout(limit.as_secs())
                })?,
            None => request_builder.send().await,
        };
        metrics::histogram!("relay_upstream_header_seconds").record(started.elapsed().as_secs_f64());

        let upstream = sent.map_err(|e| {
            let message = describe_error(&e);
            error!("Upstream request to {} failed: {}", target, message);
            Error::Upstream(message)
        })?;

        let status = upstream.status();
        debug!("Upstream {} answered {}", target, status);

        // not our failure, the player gets the origin's status and body as is
        if !status.is_success() {
            warn!("Origin returned {} for {}", status, target);
        }

        let response_headers =
            build_response_headers(upstream.headers(), self.options.content_type_policy);

        let body = if method == Method::HEAD {
            Body::empty()
        } else {
            // chunks go out in arrival order, dropping the body (client gone) drops the upstream
            let target = target.clone();
            Body::from_stream(upstream.bytes_stream().inspect_err(move |e| {
                warn!("Upstream body from {} broke off: {}", target, e);
            }))
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;

        Ok(response)
    }
}
