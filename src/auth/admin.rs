// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forum administrator check.
//!
//! The forum's admin roster page lists the members of the administrators
//! group alongside the user the session belongs to. Both names come from
//! the same response for the same session, so the comparison never mixes
//! identities resolved through different paths.

use serde::Deserialize;

use super::{AuthError, ForumSession};
use crate::providers::{ForumClient, ForumError};

pub const ADMIN_ROSTER_PATH: &str = "/api/admin/manage/admins-mods";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AdminRoster {
    pub admins: RosterGroup,
    pub user: RosterUser,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RosterGroup {
    #[serde(default)]
    pub members: Vec<RosterUser>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RosterUser {
    #[serde(default)]
    pub username: Option<String>,
}

impl AdminRoster {
    /// Exact, case-sensitive username match against the administrators.
    pub fn is_admin(&self) -> bool {
        let Some(current) = self.user.username.as_deref() else {
            return false;
        };
        self.admins
            .members
            .iter()
            .any(|member| member.username.as_deref() == Some(current))
    }
}

/// Verify that `session` belongs to a forum administrator.
///
/// Returns the administrator's username. Any failure denies.
pub async fn check_admin(forum: &ForumClient, session: &ForumSession) -> Result<String, AuthError> {
    let response = forum
        .get(ADMIN_ROSTER_PATH, session.forwarded_headers())
        .await
        .map_err(AuthError::AdminCheck)?;

    let roster: AdminRoster = serde_json::from_value(response.body).map_err(|e| {
        AuthError::AdminCheck(ForumError::InvalidResponse(format!("admin roster: {e}")))
    })?;

    if !roster.is_admin() {
        return Err(AuthError::NotAdmin);
    }

    roster.user.username.ok_or(AuthError::NotAdmin)
}
