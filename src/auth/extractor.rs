// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for forum sessions.
//!
//! ```rust,ignore
//! async fn notifications(Session(session): Session, State(state): State<AppState>) {
//!     // session.forwarded_headers() goes straight to the forum
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{admin::check_admin, AuthError, ForumSession};
use crate::state::AppState;

/// Extractor for requests carrying a forum session and CSRF token.
pub struct Session(pub ForumSession);

impl FromRequestParts<AppState> for Session {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if middleware already validated the session
        if let Some(session) = parts.extensions.get::<ForumSession>().cloned() {
            return Ok(Session(session));
        }

        ForumSession::from_headers(&parts.headers, &state.config.session_cookie_name).map(Session)
    }
}

/// Session that also carries a well-formed `User-Id` cookie.
pub struct IdentifiedSession {
    pub session: ForumSession,
    pub uid: String,
}

impl FromRequestParts<AppState> for IdentifiedSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Session(session) = Session::from_request_parts(parts, state).await?;
        let uid = session.require_user_id()?.to_string();
        Ok(IdentifiedSession { session, uid })
    }
}

/// Session belonging to a forum administrator.
///
/// Performs the roster lookup on every request; nothing is cached.
pub struct AdminOnly {
    pub session: ForumSession,
    pub username: String,
}

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Session(session) = Session::from_request_parts(parts, state).await?;

        match check_admin(&state.forum, &session).await {
            Ok(username) => Ok(AdminOnly { session, username }),
            Err(e) => {
                tracing::warn!(error = %e, "admin check denied");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    use crate::config::AppConfig;

    fn state() -> AppState {
        AppState::in_memory(AppConfig::for_forum("http://forum.invalid").unwrap()).unwrap()
    }

    fn parts(cookie: Option<&str>, csrf: Option<&str>) -> Parts {
        let mut builder = Request::get("/");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        if let Some(csrf) = csrf {
            builder = builder.header("x-csrf-token", csrf);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn session_is_read_from_headers() {
        let mut parts = parts(Some("express.sid=abc"), Some("tok"));
        let Session(session) = Session::from_request_parts(&mut parts, &state())
            .await
            .unwrap();
        assert_eq!(session.forwarded_headers().cookie().unwrap(), "express.sid=abc");
    }

    #[tokio::test]
    async fn session_prefers_extension() {
        let mut parts = parts(None, None);
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("cookie", "express.sid=xyz; User-Id=5".parse().unwrap());
        headers.insert("x-csrf-token", "t".parse().unwrap());
        parts
            .extensions
            .insert(ForumSession::from_headers(&headers, "express.sid").unwrap());

        let Session(session) = Session::from_request_parts(&mut parts, &state())
            .await
            .unwrap();
        assert_eq!(session.user_id(), Some("5"));
    }

    #[tokio::test]
    async fn identified_session_requires_user_id() {
        let mut parts = parts(Some("express.sid=abc"), Some("tok"));
        let err = IdentifiedSession::from_request_parts(&mut parts, &state())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::MissingUserId));

        let mut parts = parts_with_uid("42");
        let identified = IdentifiedSession::from_request_parts(&mut parts, &state())
            .await
            .unwrap();
        assert_eq!(identified.uid, "42");
    }

    #[tokio::test]
    async fn identified_session_rejects_malformed_user_id() {
        let mut parts = parts_with_uid("../1");
        let err = IdentifiedSession::from_request_parts(&mut parts, &state())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::MissingUserId));
    }

    #[tokio::test]
    async fn admin_only_stops_before_forum_without_session() {
        let mut parts = parts(Some("express.sid=abc"), None);
        let err = AdminOnly::from_request_parts(&mut parts, &state())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::MissingCsrfToken));
    }

    fn parts_with_uid(uid: &str) -> Parts {
        let cookie = format!("express.sid=abc; User-Id={uid}");
        parts(Some(&cookie), Some("tok"))
    }
}
