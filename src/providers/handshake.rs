// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forum login handshake.
//!
//! NodeBB only accepts a login from a client that already holds an anonymous
//! session and its CSRF token, so logging in takes two sequential calls:
//!
//! 1. `GET /api/config` returns the CSRF token in the body and an anonymous
//!    session cookie in `Set-Cookie`.
//! 2. `POST /api/v3/utilities/login` with both, plus the credentials. The
//!    forum answers with a *new* session cookie bound to the user; the
//!    anonymous one from step 1 is dead after this point.

use std::fmt;

use reqwest::{header::HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::forum::{ForumClient, ForumError, ForumRequest, ForwardedHeaders};
use crate::auth::cookies::{find_set_cookie, set_cookie_pair};

pub const CONFIG_PATH: &str = "/api/config";
pub const LOGIN_PATH: &str = "/api/v3/utilities/login";

/// Status code NodeBB puts in `status.code` on success.
const STATUS_OK: &str = "ok";

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// Step 1 did not yield a CSRF token and an anonymous session cookie.
    #[error("login handshake could not start: {0}")]
    InitFailed(&'static str),

    #[error("invalid username or password")]
    InvalidCredentials,

    /// Step 2 succeeded but carried no session cookie.
    #[error("forum login returned no session cookie")]
    MissingLoginCookie,

    #[error(transparent)]
    Forum(#[from] ForumError),
}

/// Forum user id. NodeBB sends numbers, but some plugins send strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Uid {
    Number(u64),
    Text(String),
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uid::Number(n) => write!(f, "{n}"),
            Uid::Text(s) => f.write_str(s),
        }
    }
}

/// User object returned by a successful login.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ForumUser {
    pub uid: Uid,
    pub username: String,
    #[serde(rename = "email:confirmed", default)]
    email_confirmed: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ForumUser {
    /// NodeBB reports `1` (older releases) or `true`.
    pub fn email_confirmed(&self) -> bool {
        matches!(&self.email_confirmed, Value::Bool(true)) || self.email_confirmed.as_u64() == Some(1)
    }
}

/// Credentials posted in step 2.
#[derive(Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Authenticated session produced by the handshake.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// `Set-Cookie` value from the login response, unmodified.
    pub session_cookie: String,
    pub csrf_token: String,
    pub user: ForumUser,
}

impl ForumClient {
    /// Run the two-step login handshake.
    ///
    /// `cookie_name` is the forum's session cookie name.
    pub async fn login(
        &self,
        cookie_name: &str,
        credentials: Credentials<'_>,
    ) -> Result<AuthSession, HandshakeError> {
        let config = self.get(CONFIG_PATH, &ForwardedHeaders::anonymous()).await?;

        let csrf_token = config
            .body
            .get("csrf_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or(HandshakeError::InitFailed("no CSRF token in forum config"))?
            .to_string();

        let anonymous_cookie = find_set_cookie(&config.set_cookies, cookie_name)
            .ok_or(HandshakeError::InitFailed("no session cookie in forum config"))?;

        let headers = ForwardedHeaders::session(
            header_value(set_cookie_pair(anonymous_cookie))?,
            header_value(&csrf_token)?,
        );
        let body = serde_json::to_value(&credentials)
            .map_err(|e| ForumError::Request(format!("serialize credentials failed: {e}")))?;

        let login = self
            .send_raw(ForumRequest::new(Method::POST, LOGIN_PATH, &headers).json(&body))
            .await?;

        let code = login.body.pointer("/status/code").and_then(Value::as_str);
        if code != Some(STATUS_OK) || !login.status.is_success() {
            if login.status.is_server_error() {
                return Err(ForumError::Status {
                    status: login.status,
                    body: login.body,
                }
                .into());
            }
            warn!(
                status = login.status.as_u16(),
                code = code.unwrap_or("<none>"),
                "forum rejected login"
            );
            return Err(HandshakeError::InvalidCredentials);
        }

        let session_cookie = find_set_cookie(&login.set_cookies, cookie_name)
            .ok_or(HandshakeError::MissingLoginCookie)?
            .to_string();

        let user_value = login
            .body
            .get("response")
            .cloned()
            .ok_or_else(|| ForumError::InvalidResponse("login response has no user".into()))?;
        let user: ForumUser = serde_json::from_value(user_value)
            .map_err(|e| ForumError::InvalidResponse(format!("login user: {e}")))?;

        info!(uid = %user.uid, "forum login handshake completed");

        Ok(AuthSession {
            session_cookie,
            csrf_token,
            user,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ForumError> {
    HeaderValue::from_str(value)
        .map_err(|_| ForumError::InvalidResponse("forum sent a value unusable as a header".into()))
}
