// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session handling for requests forwarded to the forum.
//!
//! ## Auth Flow
//!
//! 1. The frontend logs in through `POST /v1/user/login`; the gateway runs
//!    the forum login handshake and hands back the forum session cookie,
//!    a `User-Id` cookie and the CSRF token.
//! 2. Later requests carry the forum cookie plus `X-CSRF-Token`.
//! 3. The gateway:
//!    - rejects requests missing either before contacting the forum
//!    - forwards the `Cookie` header verbatim with the token
//!    - for admin routes, checks the forum's administrators roster
//!
//! ## Security
//!
//! - The CSRF token is only ever read from the request header
//! - The `User-Id` cookie must be a plain decimal id
//! - Admin status is checked against the forum on every request

pub mod admin;
pub mod cookies;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod session;

pub use admin::check_admin;
pub use error::AuthError;
pub use extractor::{AdminOnly, IdentifiedSession, Session};
pub use session::ForumSession;
