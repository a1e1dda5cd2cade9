// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account directory used for sign-up uniqueness checks.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("directory lock poisoned")]
    Poisoned,
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// A known forum account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub uid: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DirectoryUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            uid: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }
}

/// Lookup of existing accounts by exact username or email.
pub trait UserDirectory: Send + Sync {
    fn find_by_username(&self, username: &str) -> DirectoryResult<Option<DirectoryUser>>;

    fn find_by_email(&self, email: &str) -> DirectoryResult<Option<DirectoryUser>>;

    /// Record an account. Fails if the username or email is taken.
    fn insert(&self, user: DirectoryUser) -> DirectoryResult<()>;

    /// Cheap availability check for readiness probes.
    fn ping(&self) -> DirectoryResult<()> {
        Ok(())
    }
}

/// Process-local directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, DirectoryUser>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = DirectoryUser>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_username(&self, username: &str) -> DirectoryResult<Option<DirectoryUser>> {
        let users = self.users.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(users.get(username).cloned())
    }

    fn find_by_email(&self, email: &str) -> DirectoryResult<Option<DirectoryUser>> {
        let users = self.users.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    fn insert(&self, user: DirectoryUser) -> DirectoryResult<()> {
        let mut users = self.users.write().map_err(|_| DirectoryError::Poisoned)?;
        if users.contains_key(&user.username) {
            return Err(DirectoryError::AlreadyExists(format!("username {}", user.username)));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(DirectoryError::AlreadyExists(format!("email {}", user.email)));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }
}
