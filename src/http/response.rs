//! Decision → HTTP response mapping.
//!
//! # Mapping
//! - `bot`, `shield` → 403
//! - `rate_limit` → 429
//! - `internal_error` (or any other denial) → 500
//!
//! Bodies are `{"error": <stable code>, "message": <human text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::security::decision::{Decision, ReasonKind};

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'static str,
    pub message: &'a str,
}

/// Status and stable error code for a denial reason.
pub fn denial_status(reason: ReasonKind) -> (StatusCode, &'static str) {
    match reason {
        ReasonKind::Bot => (StatusCode::FORBIDDEN, "bot_detected"),
        ReasonKind::Shield => (StatusCode::FORBIDDEN, "shield_blocked"),
        ReasonKind::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded"),
        ReasonKind::InternalError | ReasonKind::None => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

/// Response for a denied decision.
pub fn denial_response(decision: &Decision) -> Response {
    let (status, code) = denial_status(decision.reason);
    let body = ErrorBody {
        error: code,
        message: &decision.message,
    };
    (status, Json(body)).into_response()
}
