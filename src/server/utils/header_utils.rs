use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use tracing::debug;

use crate::config::ContentTypePolicy;

pub const TRANSPORT_STREAM_MIME: &str = "video/mp2t";

pub const CORS_ALLOW_METHODS: &str = "GET, HEAD, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Range, Content-Type";
pub const CORS_EXPOSE_HEADERS: &str = "Content-Length, Content-Range, Content-Type, Accept-Ranges";
const CORS_MAX_AGE: &str = "86400";

// connection scoped, hyper frames each leg itself
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

// never copied from the client, the origin would either reject them or see the relay's address
static CLIENT_ONLY: [HeaderName; 4] = [header::HOST, header::ORIGIN, header::REFERER, header::RANGE];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

pub struct UpstreamHeaderOptions<'a> {
    pub user_agent: &'a str,
    /// persistent listener deployments hold origin connections open
    pub keep_alive: bool,
    /// bidirectional mode, copy the client's end to end headers first
    pub forward_inbound: bool,
}

/// builds the origin request headers in a fixed order, later steps replace earlier ones:
/// forwarded client headers, player identity, connection, then range for non segments
pub fn build_upstream_headers(
    inbound: &HeaderMap,
    is_segment: bool,
    options: &UpstreamHeaderOptions<'_>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if options.forward_inbound {
        for (name, value) in inbound {
            if is_hop_by_hop(name) || CLIENT_ONLY.contains(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
    }

    match HeaderValue::from_str(options.user_agent) {
        Ok(agent) => {
            headers.insert(header::USER_AGENT, agent);
        }
        Err(_) => debug!("configured user agent is not a valid header value, skipping"),
    }
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

    if options.keep_alive {
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    }

    // origins truncate ranged segment responses, so segments are always fetched whole
    if !is_segment {
        if let Some(range) = inbound.get(header::RANGE) {
            headers.insert(header::RANGE, range.clone());
        }
    }

    headers
}

/// overwrites (never appends) the cors set, origins that send their own lose
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(CORS_EXPOSE_HEADERS),
    );
}

/// headers for a preflight answer
pub fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    apply_cors_headers(&mut headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(CORS_MAX_AGE),
    );
    headers
}

/// header names the sender listed in `Connection`, lowercased. they only apply to that hop
pub fn connection_tokens(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// client facing headers: upstream copy minus hop by hop, then the content policy, then cors.
/// overrides always win over whatever the origin sent
pub fn build_response_headers(upstream: &HeaderMap, policy: ContentTypePolicy) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + 4);
    let connection_scoped = connection_tokens(upstream);

    for (name, value) in upstream {
        if is_hop_by_hop(name) || connection_scoped.iter().any(|token| token == name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if policy == ContentTypePolicy::Forced {
        // attachment makes browsers download the segment instead of handing it to the player
        headers.remove(header::CONTENT_DISPOSITION);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(TRANSPORT_STREAM_MIME),
        );
    }

    apply_cors_headers(&mut headers);
    headers
}
