// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints under `/v1/user`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{
        header::{HeaderMap, HeaderValue, SET_COOKIE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::validation::{json_body, validate_login, validate_sign_up};
use crate::auth::cookies::{CookieAttributes, USER_ID_COOKIE};
use crate::auth::{AdminOnly, IdentifiedSession, Session};
use crate::error::ApiError;
use crate::models::{
    DuplicateUserBody, LoginRequest, LoginResponse, NotificationCountResponse, NotificationList,
    SignUpRequest, ValidationErrorBody,
};
use crate::providers::{
    Credentials, ForumError, ForumRequest, ForwardedHeaders, Uid, CSRF_HEADER,
};
use crate::state::AppState;
use crate::storage::{DirectoryError, DirectoryUser};

pub const CREATE_USER_PATH: &str = "/api/v3/users";
pub const NOTIFICATIONS_PATH: &str = "/api/notifications";

/// uid the forum attributes privileged writes to when called with the
/// master bearer token.
const SERVICE_UID: u64 = 1;

// =============================================================================
// Sign-up
// =============================================================================

/// Create a forum account.
///
/// The username and email must be unknown to the account directory. The
/// forum's answer is returned unchanged.
#[utoipa::path(
    post,
    path = "/v1/user/sign-up",
    tag = "User",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Forum response to the account creation"),
        (status = 400, description = "Invalid input, or username or email already taken", body = ValidationErrorBody),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    validate_sign_up(&request)?;

    let username_taken = state.directory.find_by_username(&request.username)?.is_some();
    let email_taken = state.directory.find_by_email(&request.email)?.is_some();
    if username_taken || email_taken {
        info!(username_taken, email_taken, "sign-up rejected: account exists");
        return Ok(duplicate_user());
    }

    let token = state
        .config
        .forum_bearer_token
        .as_deref()
        .ok_or_else(|| ApiError::internal("FORUM_BEARER_TOKEN is not configured"))?;
    let headers = ForwardedHeaders::service(token)?;

    let body = json!({
        "_uid": SERVICE_UID,
        "username": request.username,
        "password": request.password,
        "email": request.email,
    });
    let response = state
        .forum
        .send_raw(ForumRequest::new(Method::POST, CREATE_USER_PATH, &headers).json(&body))
        .await?;

    if response.status.is_success() {
        let mut user = DirectoryUser::new(&request.username, &request.email);
        let uid = response
            .body
            .pointer("/response/uid")
            .and_then(|v| serde_json::from_value::<Uid>(v.clone()).ok());
        if let Some(uid) = uid {
            user = user.with_uid(uid.to_string());
        }
        match state.directory.insert(user) {
            Ok(()) => info!(username = %request.username, "account created"),
            Err(DirectoryError::AlreadyExists(what)) => {
                warn!(%what, "account created but already in directory")
            }
            Err(e) => warn!(error = %e, "account created but not recorded in directory"),
        }
    }

    Ok((response.status, Json(response.body)).into_response())
}

fn duplicate_user() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(DuplicateUserBody {
            status: "error".to_string(),
            errors: "User already exists".to_string(),
        }),
    )
        .into_response()
}

// =============================================================================
// Login
// =============================================================================

/// Log in with forum credentials.
///
/// Sets the forum session cookie exactly as the forum issued it, plus a
/// `User-Id` cookie. The CSRF token comes back in the body and in the
/// `X-CSRF-Token` header.
#[utoipa::path(
    post,
    path = "/v1/user/login",
    tag = "User",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid input", body = ValidationErrorBody),
        (status = 401, description = "Invalid username or password"),
        (status = 504, description = "Forum did not respond"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    validate_login(&request)?;

    let session = state
        .forum
        .login(
            &state.config.session_cookie_name,
            Credentials {
                username: &request.username,
                password: &request.password,
            },
        )
        .await?;

    let user_id_cookie = CookieAttributes::frontend_readable(state.config.secure_cookies)
        .build_set_cookie(USER_ID_COOKIE, &session.user.uid.to_string());

    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, header_value(&session.session_cookie)?);
    headers.append(SET_COOKIE, header_value(&user_id_cookie)?);
    headers.insert(CSRF_HEADER, header_value(&session.csrf_token)?);

    Ok((headers, Json(LoginResponse::from(&session))).into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(ApiError::internal)
}

// =============================================================================
// Session routes
// =============================================================================

/// Profile of the logged-in user.
#[utoipa::path(
    get,
    path = "/v1/user",
    tag = "User",
    params(
        ("X-CSRF-Token" = String, Header, description = "CSRF token returned at login"),
    ),
    responses(
        (status = 200, description = "Forum user object"),
        (status = 401, description = "Missing session, CSRF token or User-Id cookie"),
        (status = 404, description = "User not found"),
        (status = 504, description = "Forum did not respond"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    IdentifiedSession { session, uid }: IdentifiedSession,
) -> Result<Json<Value>, ApiError> {
    let path = format!("/api/user/uid/{uid}");
    fetch_user(&state, &path, session.forwarded_headers()).await
}

/// Profile of the logged-in administrator.
#[utoipa::path(
    get,
    path = "/v1/user/admin",
    tag = "User",
    params(
        ("X-CSRF-Token" = String, Header, description = "CSRF token returned at login"),
    ),
    responses(
        (status = 200, description = "Forum user object of the administrator"),
        (status = 401, description = "Missing session or CSRF token"),
        (status = 403, description = "Not an administrator"),
        (status = 504, description = "Forum did not respond"),
    )
)]
pub async fn get_admin_profile(
    State(state): State<AppState>,
    AdminOnly { session, username }: AdminOnly,
) -> Result<Json<Value>, ApiError> {
    let path = format!("/api/user/username/{}", urlencoding::encode(&username));
    fetch_user(&state, &path, session.forwarded_headers()).await
}

async fn fetch_user(
    state: &AppState,
    path: &str,
    headers: &ForwardedHeaders,
) -> Result<Json<Value>, ApiError> {
    match state.forum.get(path, headers).await {
        Ok(response) if response.body.is_null() => Err(ApiError::not_found("User not found")),
        Ok(response) => Ok(Json(response.body)),
        Err(ForumError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
            Err(ApiError::not_found("User not found"))
        }
        Err(ForumError::Unreachable(cause)) => Err(ForumError::Unreachable(cause).into()),
        Err(e) => Err(ApiError::internal(e)),
    }
}

/// Number of unread chat notifications.
#[utoipa::path(
    get,
    path = "/v1/user/notifications",
    tag = "User",
    params(
        ("X-CSRF-Token" = String, Header, description = "CSRF token returned at login"),
    ),
    responses(
        (status = 200, description = "Unread chat count", body = NotificationCountResponse),
        (status = 401, description = "Missing session or CSRF token"),
        (status = 504, description = "Forum did not respond"),
    )
)]
pub async fn notification_count(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<Json<NotificationCountResponse>, ApiError> {
    let response = state
        .forum
        .get(NOTIFICATIONS_PATH, session.forwarded_headers())
        .await?;

    let list: NotificationList = if response.body.is_null() {
        NotificationList::default()
    } else {
        serde_json::from_value(response.body).map_err(ApiError::internal)?
    };

    Ok(Json(NotificationCountResponse {
        chat_notifications_count: list.unread_chats(),
    }))
}
