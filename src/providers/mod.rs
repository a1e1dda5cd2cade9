// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream integrations.

pub mod forum;
pub mod handshake;

pub use forum::{
    ForumClient, ForumError, ForumRequest, ForumResponse, ForwardedHeaders, CSRF_HEADER,
};
pub use handshake::{AuthSession, Credentials, ForumUser, HandshakeError, Uid};
