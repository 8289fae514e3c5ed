use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::types::ErrorResponse;

/// Every way a search request can fail. Each variant is terminal for the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Access not allowed.")]
    Unauthorized,

    #[error("No search term provided.")]
    MissingSearchTerm,

    #[error("{0}")]
    UpstreamTransport(String),

    #[error("Request Failed. Status Code: {0}")]
    UpstreamStatus(u16),

    #[error("Invalid content-type. Expected application/json but received {0}")]
    UpstreamContentType(String),

    #[error("{0}")]
    UpstreamParse(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::MissingSearchTerm => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamTransport(_)
            | ProxyError::UpstreamStatus(_)
            | ProxyError::UpstreamContentType(_)
            | ProxyError::UpstreamParse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}
