// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session middleware for Axum.
//!
//! Applied to every router subtree that talks to the forum on behalf of a
//! user. It rejects requests lacking session material before any handler
//! runs, and stores the validated [`ForumSession`] in the request extensions
//! where the extractors in `extractor.rs` pick it up.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/notifications", get(notifications))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         require_session,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::ForumSession;
use crate::state::AppState;

/// Reject requests without a forum session and CSRF token.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match ForumSession::from_headers(request.headers(), &state.config.session_cookie_name) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), path = %request.uri().path(), "session rejected");
            e.into_response()
        }
    }
}
