use axum::Extension;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;
use url::Url;

use crate::config::TargetMode;
use crate::server::error::Error;
use crate::server::services::EdgeServices;
use crate::server::utils::target_utils::{
    decode_query_target, is_segment, path_target, query_target, validate_target,
};

/// validated upstream url, a request that gets past this extractor is safe to fetch
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub url: Url,
    pub is_segment: bool,
}

impl<S> FromRequestParts<S> for RelayTarget
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(services): Extension<EdgeServices> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| Error::InternalServerErrorWithContext(err.to_string()))?;

        let raw = match services.config.target_mode {
            // query is decoded by hand, serde would turn a literal '+' into a space
            TargetMode::Query => query_target(parts.uri.query())
                .map(decode_query_target)
                .transpose()?,
            TargetMode::Path => path_target(&parts.uri),
        }
        .ok_or(Error::MissingTarget)?;

        let url = validate_target(&raw).inspect_err(|e| {
            debug!("Rejected target '{}': {:?}", raw, e);
        })?;
        let is_segment = is_segment(&url, &services.config.segment_suffixes);

        Ok(RelayTarget { url, is_segment })
    }
}
