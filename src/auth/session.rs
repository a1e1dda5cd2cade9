// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forum session extraction.
//!
//! A request is forwarded to the forum only when it carries both the forum
//! session cookie and the CSRF token header. The token is read from the
//! `X-CSRF-Token` header, never from a cookie, so a cross-site request that
//! rides on the browser's cookies cannot supply it.

use axum::http::header::{HeaderMap, HeaderValue, COOKIE};

use super::cookies::{find_cookie, USER_ID_COOKIE};
use super::AuthError;
use crate::providers::{ForwardedHeaders, CSRF_HEADER};

/// Session credentials of one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForumSession {
    headers: ForwardedHeaders,
    user_id: Option<String>,
}

impl ForumSession {
    /// Validate and capture the session material in `headers`.
    ///
    /// Checks run in a fixed order: session cookie, then CSRF token. The user
    /// id cookie is optional here; see [`ForumSession::require_user_id`].
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Result<Self, AuthError> {
        let cookie = cookie_header(headers).ok_or(AuthError::NoSession)?;
        let cookie_str = cookie.to_str().map_err(|_| AuthError::NoSession)?;
        if find_cookie(cookie_str, cookie_name).is_none() {
            return Err(AuthError::NoSession);
        }

        let csrf_token = headers
            .get(CSRF_HEADER)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(AuthError::MissingCsrfToken)?;

        let user_id = find_cookie(cookie_str, USER_ID_COOKIE)
            .filter(|uid| is_valid_uid(uid))
            .map(str::to_string);

        Ok(Self {
            headers: ForwardedHeaders::session(cookie, csrf_token),
            user_id,
        })
    }

    /// Headers to send to the forum on behalf of this session.
    pub fn forwarded_headers(&self) -> &ForwardedHeaders {
        &self.headers
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn require_user_id(&self) -> Result<&str, AuthError> {
        self.user_id().ok_or(AuthError::MissingUserId)
    }
}

/// The inbound `Cookie` header, untouched.
///
/// HTTP/2 clients may split cookies over several headers; those are joined
/// with `"; "` as RFC 6265 prescribes for the upstream HTTP/1.1 hop.
fn cookie_header(headers: &HeaderMap) -> Option<HeaderValue> {
    let mut values = headers.get_all(COOKIE).iter();
    let first = values.next()?;
    let rest: Vec<&HeaderValue> = values.collect();
    if rest.is_empty() {
        return Some(first.clone());
    }

    let mut joined = first.as_bytes().to_vec();
    for value in rest {
        joined.extend_from_slice(b"; ");
        joined.extend_from_slice(value.as_bytes());
    }
    HeaderValue::from_bytes(&joined).ok()
}

/// Forum user ids are positive integers; anything else is ignored so it
/// cannot be spliced into an upstream path.
fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty() && uid.len() <= 20 && uid.bytes().all(|b| b.is_ascii_digit())
}
