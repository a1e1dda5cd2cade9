// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::{ForumClient, ForumError};
use crate::storage::{InMemoryDirectory, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub forum: ForumClient,
    pub directory: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(config: AppConfig, forum: ForumClient, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            config: Arc::new(config),
            forum,
            directory,
        }
    }

    /// State with a forum client built from `config` and the given directory.
    pub fn from_config(
        config: AppConfig,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, ForumError> {
        let forum = ForumClient::from_config(&config)?;
        Ok(Self::new(config, forum, directory))
    }

    /// State with an empty in-memory directory.
    pub fn in_memory(config: AppConfig) -> Result<Self, ForumError> {
        Self::from_config(config, Arc::new(InMemoryDirectory::new()))
    }
}
