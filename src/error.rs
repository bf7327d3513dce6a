//! Error taxonomy for advice requests and its HTTP rendering.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::routing::GeocodeFailure;

/// Maximum number of characters of a provider error body echoed back.
const PROVIDER_BODY_LIMIT: usize = 500;

pub type Result<T, E = AdviceError> = std::result::Result<T, E>;

/// Every way an advice request can fail.
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("Invalid trip details: {0}")]
    InvalidInput(String),

    #[error("Please select a valid route on the map to calculate the distance.")]
    InvalidRoute,

    #[error("{0}")]
    RouteUnavailable(GeocodeFailure),

    #[error("The advice service is unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("The advice service returned an error ({status}): {body}")]
    ProviderError { status: u16, body: String },

    #[error("The advice service returned an empty response.")]
    EmptyResponse,

    #[error("The advice service returned an invalid response: {0}")]
    MalformedResponse(String),
}

impl AdviceError {
    /// Build a `ProviderError`, truncating the body to a displayable length.
    pub fn provider(status: u16, body: &str) -> Self {
        Self::ProviderError {
            status,
            body: body.trim().chars().take(PROVIDER_BODY_LIMIT).collect(),
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidRoute => "invalid_route",
            Self::RouteUnavailable(_) => "route_unavailable",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::ProviderError { .. } => "provider_error",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidRoute | Self::RouteUnavailable(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ProviderError { .. } | Self::EmptyResponse | Self::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<JsonRejection> for AdviceError {
    fn from(rejection: JsonRejection) -> Self {
        AdviceError::InvalidInput(rejection.body_text())
    }
}

/// Error body returned to API callers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: &'static str,
    pub message: String,
}

impl IntoResponse for AdviceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Advice request failed: {}", self);
        } else {
            tracing::debug!(kind = self.kind(), "Advice request rejected: {}", self);
        }

        let body = ErrorResponse {
            error_type: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
