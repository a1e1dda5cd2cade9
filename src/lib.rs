// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forum Gateway - Backend-for-frontend in front of a NodeBB forum
//!
//! Authenticates users against the forum (session cookie plus CSRF token)
//! and exposes a small user-facing HTTP API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Forum session extraction and admin check
//! - `providers` - Forum REST client and login handshake
//! - `storage` - Account directory (in-memory or redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;
pub mod telemetry;
