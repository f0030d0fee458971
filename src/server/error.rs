use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::server::{dtos::error_dto::ErrorResponse, utils::header_utils::apply_cors_headers};

pub type AppResult<T> = Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing target url")]
    MissingTarget,

    #[error("malformed target url")]
    MalformedTarget(String),

    #[error("upstream request failed")]
    Upstream(String),

    #[error("upstream did not answer within {0} seconds")]
    UpstreamTimeout(u64),

    #[error("not found")]
    NotFound,

    #[error("internal server error")]
    InternalServerErrorWithContext(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::MalformedTarget(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::UpstreamTimeout(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerErrorWithContext(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::MalformedTarget(reason) | Self::Upstream(reason) => Some(reason.clone()),
            // internal context stays in the logs
            _ => None,
        }
    }

    /// label used for the request outcome counter
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingTarget | Self::MalformedTarget(_) | Self::NotFound => "rejected",
            Self::Upstream(_) | Self::UpstreamTimeout(_) => "upstream_error",
            Self::InternalServerErrorWithContext(_) => "internal_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Self::InternalServerErrorWithContext(context) = &self {
            debug!("internal error context: {}", context);
        }

        metrics::counter!("relay_requests_total", "outcome" => self.outcome()).increment(1);

        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };

        // browsers drop a response without cors before the player ever sees the status
        let mut response = (self.status_code(), Json(body)).into_response();
        apply_cors_headers(response.headers_mut());
        response
    }
}
