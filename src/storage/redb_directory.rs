// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account directory backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `{collection}`: username → serialized [`DirectoryUser`] (JSON bytes)
//! - `{collection}_by_email`: email → username

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::directory::{DirectoryError, DirectoryResult, DirectoryUser, UserDirectory};

pub struct RedbDirectory {
    db: Database,
    users_table: String,
    email_table: String,
}

impl RedbDirectory {
    /// Open (or create) the directory at `path`, using `collection` as the
    /// table name prefix.
    pub fn open(path: &Path, collection: &str) -> DirectoryResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        let directory = Self {
            db,
            users_table: collection.to_string(),
            email_table: format!("{collection}_by_email"),
        };

        // Pre-create tables so later read transactions don't fail
        let write_txn = directory.db.begin_write()?;
        {
            let _ = write_txn.open_table(directory.users())?;
            let _ = write_txn.open_table(directory.emails())?;
        }
        write_txn.commit()?;

        Ok(directory)
    }

    fn users(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.users_table)
    }

    fn emails(&self) -> TableDefinition<'_, &'static str, &'static str> {
        TableDefinition::new(&self.email_table)
    }
}

impl UserDirectory for RedbDirectory {
    fn find_by_username(&self, username: &str) -> DirectoryResult<Option<DirectoryUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.users())?;
        match table.get(username)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_email(&self, email: &str) -> DirectoryResult<Option<DirectoryUser>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(self.emails())?;
        let Some(username) = emails.get(email)? else {
            return Ok(None);
        };

        let users = read_txn.open_table(self.users())?;
        match users.get(username.value())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn insert(&self, user: DirectoryUser) -> DirectoryResult<()> {
        let json = serde_json::to_vec(&user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(self.users())?;
            let mut emails = write_txn.open_table(self.emails())?;

            if users.get(user.username.as_str())?.is_some() {
                return Err(DirectoryError::AlreadyExists(format!(
                    "username {}",
                    user.username
                )));
            }
            if emails.get(user.email.as_str())?.is_some() {
                return Err(DirectoryError::AlreadyExists(format!("email {}", user.email)));
            }

            users.insert(user.username.as_str(), json.as_slice())?;
            emails.insert(user.email.as_str(), user.username.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn ping(&self) -> DirectoryResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(self.users())?;
        Ok(())
    }
}
