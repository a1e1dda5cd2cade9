// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input checks for sign-up and login.
//!
//! Every rule is evaluated so the caller sees all problems at once. Nothing
//! here talks to the forum; a failed check short-circuits the request.

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};

use crate::error::ApiError;
use crate::models::{FieldError, LoginRequest, SignUpRequest, ValidationErrorBody};

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 16;
pub const PASSWORD_MIN_CHARS: usize = 6;
/// NodeBB rejects longer passwords.
pub const PASSWORD_MAX_CHARS: usize = 4096;

pub fn validate_sign_up(request: &SignUpRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    let username_len = request.username.chars().count();
    if request.username.trim().is_empty() {
        errors.push(field_error("username", "Username is required"));
    } else if request.username.trim() != request.username {
        errors.push(field_error(
            "username",
            "Username must not start or end with whitespace",
        ));
    } else if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len) {
        errors.push(field_error(
            "username",
            format!(
                "Username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
            ),
        ));
    }

    let password_len = request.password.chars().count();
    if password_len == 0 {
        errors.push(field_error("password", "Password is required"));
    } else if password_len < PASSWORD_MIN_CHARS {
        errors.push(field_error(
            "password",
            format!("Password must be at least {PASSWORD_MIN_CHARS} characters"),
        ));
    } else if password_len > PASSWORD_MAX_CHARS {
        errors.push(field_error("password", "Password is too long"));
    }

    if request.email.trim().is_empty() {
        errors.push(field_error("email", "Email is required"));
    } else if !is_email(&request.email) {
        errors.push(field_error("email", "Email is invalid"));
    }

    finish(errors)
}

pub fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if request.username.trim().is_empty() {
        errors.push(field_error("username", "Username is required"));
    }
    if request.password.is_empty() {
        errors.push(field_error("password", "Password is required"));
    }
    finish(errors)
}

/// Unwrap a JSON body, turning a malformed or mistyped body into the same
/// 400 shape as a failed field check.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "rejected request body"
            );
            Err(rejected(vec![field_error("body", rejection.body_text())]))
        }
    }
}

/// `local@domain.tld` with no whitespace and non-empty labels.
fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && host.split('.').all(|label| !label.is_empty())
}

fn field_error(field: &str, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(rejected(errors))
}

fn rejected(errors: Vec<FieldError>) -> ApiError {
    let body = ValidationErrorBody {
        success: false,
        errors,
    };
    match serde_json::to_value(&body) {
        Ok(body) => ApiError::with_body(StatusCode::BAD_REQUEST, body),
        Err(e) => ApiError::internal(e),
    }
}
