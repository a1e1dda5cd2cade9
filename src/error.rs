// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::providers::{ForumError, HandshakeError};
use crate::storage::DirectoryError;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Response body sent as-is instead of the `{error}` envelope.
    raw_body: Option<Value>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            raw_body: None,
        }
    }

    /// Respond with `status` and exactly `body`.
    pub fn with_body(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            message: status
                .canonical_reason()
                .unwrap_or("error")
                .to_string(),
            raw_body: Some(body),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }

    /// Generic 500. The cause is logged, never returned.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl From<ForumError> for ApiError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::Status { status, body } => Self::with_body(status, body),
            ForumError::Unreachable(cause) => {
                tracing::error!(error = %cause, "forum unreachable");
                Self::gateway_timeout("Forum did not respond in time")
            }
            other => Self::internal(other),
        }
    }
}

impl From<HandshakeError> for ApiError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::InvalidCredentials => {
                let message = "Invalid username or password";
                Self {
                    status: StatusCode::UNAUTHORIZED,
                    message: message.to_string(),
                    raw_body: Some(json!({ "success": false, "message": message })),
                }
            }
            HandshakeError::Forum(forum) => forum.into(),
            other => Self::internal(other),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self::internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.raw_body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => {
                let body = Json(ErrorBody {
                    error: self.message,
                });
                (self.status, body).into_response()
            }
        }
    }
}
