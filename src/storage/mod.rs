// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Directory
//!
//! Sign-up refuses usernames and emails that already belong to an account.
//! The directory answers those lookups. It is an in-memory map unless
//! `DIRECTORY_PATH` points at a redb file.

pub mod directory;
pub mod redb_directory;

pub use directory::{
    DirectoryError, DirectoryResult, DirectoryUser, InMemoryDirectory, UserDirectory,
};
pub use redb_directory::RedbDirectory;
