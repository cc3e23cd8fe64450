use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fragments_convert::ConversionError;
use fragments_core::FragmentError;
use fragments_store::StoreError;
use thiserror::Error;

use crate::response::ErrorEnvelope;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("fragment not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("{0}")]
    Fragment(#[from] FragmentError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Conversion(e) if e.is_disallowed() => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Conversion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Fragment(FragmentError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Fragment(FragmentError::Store(StoreError::NotFound(_))) => StatusCode::NOT_FOUND,
            Self::Fragment(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        // Backend details stay in the log.
        let message = if status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, ErrorEnvelope::new(status, message)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
