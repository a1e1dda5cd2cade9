// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the `/v1/user` routes. All public types
//! derive `ToSchema` for the OpenAPI document.
//!
//! Field names follow what the frontend already consumes, which is why a
//! few of them are camelCase on the wire.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::providers::{AuthSession, Uid};

// =============================================================================
// Sign-up & Login
// =============================================================================

/// New account request.
///
/// Missing fields decode as empty strings and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Credentials for `POST /v1/user/login`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginUser {
    pub uid: Uid,
    pub username: String,
    /// Whether the forum has confirmed the user's email address.
    #[serde(rename = "validEmail")]
    pub valid_email: bool,
    /// Token to send back in the `X-CSRF-Token` header.
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

impl From<&AuthSession> for LoginResponse {
    fn from(session: &AuthSession) -> Self {
        LoginResponse {
            success: true,
            user: LoginUser {
                uid: session.user.uid.clone(),
                username: session.user.username.clone(),
                valid_email: session.user.email_confirmed(),
                csrf_token: session.csrf_token.clone(),
            },
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationCountResponse {
    /// Unread chat notifications.
    pub chat_notifications_count: usize,
}

/// Subset of the forum's `/api/notifications` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationList {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub read: Option<bool>,
}

impl NotificationList {
    /// Count of `new-chat` notifications explicitly marked unread.
    pub fn unread_chats(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.kind.as_deref() == Some("new-chat") && n.read == Some(false))
            .count()
    }
}

// =============================================================================
// Error bodies
// =============================================================================

/// One failed input rule.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// 400 body for rejected input.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationErrorBody {
    pub success: bool,
    pub errors: Vec<FieldError>,
}

/// 400 body for a taken username or email.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DuplicateUserBody {
    pub status: String,
    pub errors: String,
}
