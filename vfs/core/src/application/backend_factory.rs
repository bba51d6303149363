// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Backend Factory - Application Layer
//!
//! Creates concrete storage backends and blob stores from [`VfsConfig`] so
//! callers only ever hold the domain ports.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire configuration to infrastructure adapters

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::application::media_storage::MediaFileStorage;
use crate::application::vfs::VfsBuilder;
use crate::domain::blob::BlobStore;
use crate::domain::config::{BlobConfig, StorageConfig, VfsConfig};
use crate::domain::file::ScopeId;
use crate::domain::path_validator::PathValidator;
use crate::domain::storage::StorageBackend;
use crate::infrastructure::blob::OpendalBlobStore;
use crate::infrastructure::db::Database;
use crate::infrastructure::storage::{DocumentStorageBackend, InMemoryStorageBackend, PostgresStorageBackend};

/// Creates a StorageBackend implementation based on the configured backend
pub async fn create_storage_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(InMemoryStorageBackend::shared())),
        StorageConfig::Postgres { url, max_connections } => {
            let db = Database::with_max_connections(url, *max_connections).await?;
            Ok(Arc::new(PostgresStorageBackend::new(db.get_pool().clone())))
        }
        StorageConfig::Document {
            url,
            token,
            timeout_secs,
        } => {
            let backend =
                DocumentStorageBackend::with_timeout(url.clone(), token.clone(), Duration::from_secs(*timeout_secs))
                    .context("Failed to build document API client")?;
            Ok(Arc::new(backend))
        }
    }
}

/// Creates a BlobStore implementation based on the configured backend
pub fn create_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>> {
    Ok(Arc::new(OpendalBlobStore::from_config(config)?))
}

/// Façade builder carrying the configured path limit and transfer mode
pub fn vfs_builder(config: &VfsConfig, backend: Arc<dyn StorageBackend>, scope: ScopeId) -> VfsBuilder {
    VfsBuilder::new(backend, scope)
        .max_path_length(config.spec.paths.max_length)
        .transfer_mode(config.spec.facade.transfer)
}

/// Media storage sharing `backend` with the façade
pub fn media_storage(
    config: &VfsConfig,
    blob_store: Arc<dyn BlobStore>,
    backend: Arc<dyn StorageBackend>,
    scope: ScopeId,
) -> MediaFileStorage {
    MediaFileStorage::new(blob_store, backend, scope)
        .with_validator(PathValidator::with_max_length(config.spec.paths.max_length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::TransferMode;
    use crate::domain::error::VfsErrorCode;
    use crate::domain::file::VFile;

    #[tokio::test]
    async fn test_memory_backend_from_default_config() {
        let backend = create_storage_backend(&StorageConfig::Memory).await.unwrap();
        assert_eq!(backend.name(), "memory");
    }

    #[tokio::test]
    async fn test_document_backend_from_config() {
        let backend = create_storage_backend(&StorageConfig::Document {
            url: "https://docs.example.com".to_string(),
            token: None,
            timeout_secs: 5,
        })
        .await
        .unwrap();
        assert_eq!(backend.name(), "document");
    }

    #[tokio::test]
    async fn test_builder_applies_config() {
        let mut config = VfsConfig::default();
        config.spec.paths.max_length = 6;
        config.spec.facade.transfer = TransferMode::NativeOnly;

        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryStorageBackend::isolated());
        let vfs = vfs_builder(&config, backend, ScopeId::new("cfg").unwrap()).build_strict();

        let err = vfs.write_file(VFile::new("/longer", "x")).await.unwrap_err();
        assert_eq!(err.code, VfsErrorCode::InvalidPath);
    }
}
