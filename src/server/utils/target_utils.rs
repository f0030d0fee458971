use axum::http::Uri;
use url::Url;

use crate::server::error::{AppResult, Error};

const SCHEME_PREFIXES: [&str; 2] = ["http://", "https://"];

/// the query parameter carrying the target in query mode
pub const TARGET_PARAM: &str = "url";

fn strip_scheme(value: &str) -> Option<&str> {
    SCHEME_PREFIXES.iter().find_map(|prefix| {
        value
            .get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| &value[prefix.len()..])
    })
}

pub fn has_scheme(value: &str) -> bool {
    strip_scheme(value).is_some()
}

/// `http://http://host/a.ts` -> `http://host/a.ts`, any number of repeats, last scheme wins
pub fn collapse_duplicate_scheme(value: &str) -> &str {
    let mut current = value.trim();
    while let Some(rest) = strip_scheme(current) {
        if !has_scheme(rest) {
            break;
        }
        current = rest;
    }
    current
}

/// raw (still encoded) value of the target parameter, `None` when absent or empty
pub fn query_target(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .find_map(|param| param.strip_prefix(TARGET_PARAM)?.strip_prefix('='))
        .filter(|value| !value.is_empty())
}

/// everything after the leading slash, query string included, used verbatim
pub fn path_target(uri: &Uri) -> Option<String> {
    let raw = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("");
    let target = raw.trim_start_matches('/');

    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// percent decodes the parameter exactly once, a literal `+` stays a `+`.
/// whatever comes out is left for validation to accept or reject
pub fn decode_query_target(raw: &str) -> AppResult<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::MalformedTarget(format!("invalid percent encoding: {}", e)))
}

/// collapses a doubled scheme and parses, only absolute http(s) urls with a host pass
pub fn validate_target(raw: &str) -> AppResult<Url> {
    let candidate = collapse_duplicate_scheme(raw);

    let url = Url::parse(candidate)
        .map_err(|e| Error::MalformedTarget(format!("{}: {}", e, candidate)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::MalformedTarget(format!(
                "unsupported scheme '{}'",
                other
            )));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::MalformedTarget("target has no host".to_string()));
    }

    Ok(url)
}

/// path only, so `chunk42.ts?seq=7` is still a segment
pub fn is_segment(url: &Url, suffixes: &[String]) -> bool {
    let path = url.path().to_ascii_lowercase();
    suffixes
        .iter()
        .map(|suffix| suffix.trim())
        .filter(|suffix| !suffix.is_empty())
        .any(|suffix| path.ends_with(&suffix.to_ascii_lowercase()))
}
