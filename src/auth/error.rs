// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::providers::ForumError;

/// Authentication and authorization failures.
///
/// Session variants are raised before any forum call is made.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No forum session cookie on the request
    #[error("No session found")]
    NoSession,
    /// Session cookie present but no CSRF token header
    #[error("No CSRF token provided")]
    MissingCsrfToken,
    /// Route needs the user id cookie and it is absent
    #[error("Could not identify session")]
    MissingUserId,
    /// Session is valid but the user is not an administrator
    #[error("Could not certify administrator")]
    NotAdmin,
    /// The admin roster could not be fetched or understood
    #[error("admin check failed: {0}")]
    AdminCheck(ForumError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    message: String,
    error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NoSession => "no_session",
            AuthError::MissingCsrfToken => "missing_csrf_token",
            AuthError::MissingUserId => "missing_user_id",
            AuthError::NotAdmin => "not_admin",
            AuthError::AdminCheck(ForumError::Status { .. }) => "admin_check_rejected",
            AuthError::AdminCheck(ForumError::Unreachable(_)) => "admin_check_timeout",
            AuthError::AdminCheck(_) => "admin_check_failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoSession | AuthError::MissingCsrfToken | AuthError::MissingUserId => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotAdmin => StatusCode::FORBIDDEN,
            AuthError::AdminCheck(err) => err.status_code(),
        }
    }

    /// Message safe to show to the caller.
    fn public_message(&self) -> String {
        match self {
            AuthError::AdminCheck(ForumError::Status { .. }) => {
                "Error validating admin session.".to_string()
            }
            AuthError::AdminCheck(ForumError::Unreachable(_)) => {
                "Server timeout while validating admin session.".to_string()
            }
            AuthError::AdminCheck(_) => "Internal error while validating admin session.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::AdminCheck(err) = &self {
            tracing::warn!(error = %err, "admin session validation failed");
        }

        let status = self.status_code();
        let details = match &self {
            AuthError::AdminCheck(ForumError::Status { body, .. }) => Some(body.clone()),
            _ => None,
        };
        let body = Json(AuthErrorBody {
            success: false,
            message: self.public_message(),
            error_code: self.error_code(),
            details,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    async fn body_of(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_session_returns_401_with_message() {
        let response = AuthError::NoSession.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No session found");
        assert_eq!(body["error_code"], "no_session");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn session_messages_are_discriminated() {
        assert_eq!(AuthError::MissingCsrfToken.to_string(), "No CSRF token provided");
        assert_eq!(AuthError::MissingUserId.to_string(), "Could not identify session");
        assert_eq!(
            AuthError::MissingCsrfToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::MissingUserId.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn not_admin_returns_403() {
        let response = AuthError::NotAdmin.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(response).await["error_code"], "not_admin");
    }

    #[tokio::test]
    async fn admin_check_passes_upstream_status_and_details() {
        let err = AuthError::AdminCheck(ForumError::Status {
            status: StatusCode::FORBIDDEN,
            body: json!({"status": {"code": "forbidden"}}),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_of(response).await;
        assert_eq!(body["message"], "Error validating admin session.");
        assert_eq!(body["details"]["status"]["code"], "forbidden");
    }

    #[tokio::test]
    async fn admin_check_timeout_is_504() {
        let response =
            AuthError::AdminCheck(ForumError::Unreachable("timed out".into())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn admin_check_bad_payload_hides_details() {
        let response =
            AuthError::AdminCheck(ForumError::InvalidResponse("missing admins".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["message"], "Internal error while validating admin session.");
        assert!(body.get("details").is_none());
    }
}
