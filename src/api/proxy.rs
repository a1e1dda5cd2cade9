// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pass-through to the forum's own API for routes the gateway does not model.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{
        header::{HeaderMap, HeaderValue, SET_COOKIE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::Session;
use crate::error::ApiError;
use crate::providers::ForumRequest;
use crate::state::AppState;

/// Methods whose JSON body is forwarded. Others forward the query string.
fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Relay a call to `/{path}` on the forum with the caller's session.
#[utoipa::path(
    get,
    path = "/v1/forum/{path}",
    tag = "Forum",
    params(
        ("path" = String, Path, description = "Forum API path, e.g. `api/recent`"),
        ("X-CSRF-Token" = String, Header, description = "CSRF token returned at login"),
    ),
    request_body(
        content = Option<Value>,
        content_type = "application/json",
        description = "JSON body forwarded on POST, PUT and PATCH"
    ),
    responses(
        (status = 200, description = "Forum response, relayed unchanged"),
        (status = 401, description = "Missing session or CSRF token"),
        (status = 504, description = "Forum did not respond"),
    )
)]
pub async fn forward(
    State(state): State<AppState>,
    Session(session): Session,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, ApiError> {
    let path = format!("/{}", path.trim_start_matches('/'));

    let json_body = if carries_body(&method) && !body.is_empty() {
        Some(
            serde_json::from_slice::<Value>(&body)
                .map_err(|e| ApiError::bad_request(format!("Request body is not JSON: {e}")))?,
        )
    } else {
        None
    };

    info!(method = %method, path = %path, "proxying to forum");

    let mut request = ForumRequest::new(method.clone(), &path, session.forwarded_headers());
    if let Some(body) = json_body.as_ref() {
        request = request.json(body);
    } else if let Some(query) = query.as_deref().filter(|_| !carries_body(&method)) {
        request = request.query(query);
    }

    let response = state.forum.send_raw(request).await?;

    if matches!(response.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        warn!(
            status = response.status.as_u16(),
            path = %path,
            "forum refused proxied call; session likely expired"
        );
    }

    let mut headers = HeaderMap::new();
    for cookie in &response.set_cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(_) => warn!("dropping unrepresentable Set-Cookie from forum"),
        }
    }

    Ok((response.status, headers, Json(response.body)).into_response())
}
