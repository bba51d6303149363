// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Studio VFS CLI

pub mod config;
pub mod file;
pub mod media;
pub mod update;

pub use self::config::ConfigCommand;
pub use self::file::FileCommand;
pub use self::media::MediaCommand;
pub use self::update::UpdateCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use studio_vfs_core::application::backend_factory;
use studio_vfs_core::domain::config::VfsConfig;
use studio_vfs_core::{ScopeId, StorageBackend};

/// Configuration, backend and scope shared by file and media commands
pub struct Session {
    pub config: VfsConfig,
    pub backend: Arc<dyn StorageBackend>,
    pub scope: ScopeId,
}

impl Session {
    pub async fn open(config_path: Option<PathBuf>, scope: &str) -> Result<Self> {
        let config = VfsConfig::load_or_default(config_path).context("Failed to load configuration")?;
        config.validate().context("Configuration validation failed")?;

        let scope = ScopeId::new(scope).context("Invalid --scope")?;
        let backend = backend_factory::create_storage_backend(&config.spec.storage)
            .await
            .context("Failed to initialise storage backend")?;

        tracing::debug!(backend = backend.name(), scope = %scope, "Opened VFS session");
        Ok(Self { config, backend, scope })
    }
}
