//! The JSON envelope every API response is wrapped in.
//!
//! Success: `{"status": "ok", ...fields}`.
//! Failure: `{"status": "error", "error": {"code": 404, "message": "..."}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    #[serde(flatten)]
    data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { status: "ok", data }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    status: &'static str,
    error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: ErrorBody {
                code: code.as_u16(),
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
