// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Storage Backend
//!
//! Volatile scope → path → record map for tests and short-lived agent
//! sessions. The map lives in a [`MemoryStore`] that is injected into the
//! backend, so parallel tests can each own one. [`MemoryStore::global`] is
//! the process-wide instance for callers that want shared state across
//! façades, and [`MemoryStore::clear_all`] resets it between test runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use crate::domain::file::{FileInfo, ScopeId, VFile};
use crate::domain::path_validator::is_within;
use crate::domain::storage::{DeleteOptions, StorageBackend, StorageError};

#[derive(Debug, Clone)]
struct StoredFile {
    file: VFile,
    last_modified: DateTime<Utc>,
}

type ScopeMap = HashMap<ScopeId, BTreeMap<String, StoredFile>>;

/// Shared scope map. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    scopes: Arc<RwLock<ScopeMap>>,
}

static GLOBAL_STORE: OnceLock<MemoryStore> = OnceLock::new();

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide store
    pub fn global() -> MemoryStore {
        GLOBAL_STORE.get_or_init(MemoryStore::new).clone()
    }

    /// Drop every scope
    pub fn clear_all(&self) {
        self.scopes.write().clear();
    }

    /// Drop one scope
    pub fn clear_scope(&self, scope: &ScopeId) {
        self.scopes.write().remove(scope);
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().len()
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryStorageBackend {
    store: MemoryStore,
}

impl InMemoryStorageBackend {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Backend over a fresh private store
    pub fn isolated() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Backend over [`MemoryStore::global`]
    pub fn shared() -> Self {
        Self::new(MemoryStore::global())
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl Default for InMemoryStorageBackend {
    fn default() -> Self {
        Self::isolated()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorageBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, scope: &ScopeId, path: &str) -> Result<Option<VFile>, StorageError> {
        let scopes = self.store.scopes.read();
        Ok(scopes
            .get(scope)
            .and_then(|files| files.get(path))
            .map(|stored| stored.file.clone()))
    }

    async fn write(&self, scope: &ScopeId, file: VFile) -> Result<(), StorageError> {
        let mut scopes = self.store.scopes.write();
        scopes.entry(scope.clone()).or_default().insert(
            file.path.clone(),
            StoredFile {
                file,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, scope: &ScopeId, path: &str, options: DeleteOptions) -> Result<(), StorageError> {
        let mut scopes = self.store.scopes.write();
        let Some(files) = scopes.get_mut(scope) else {
            return Ok(());
        };

        if options.recursive {
            let before = files.len();
            files.retain(|candidate, _| !is_within(candidate, path));
            tracing::debug!(scope = %scope, path = %path, removed = before - files.len(), "Recursive delete");
        } else {
            files.remove(path);
        }
        Ok(())
    }

    async fn list(&self, scope: &ScopeId) -> Result<Vec<FileInfo>, StorageError> {
        let scopes = self.store.scopes.read();
        Ok(scopes
            .get(scope)
            .map(|files| {
                files
                    .values()
                    .map(|stored| FileInfo::from_file(&stored.file, stored.last_modified))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn move_file(&self, scope: &ScopeId, from: &str, to: &str) -> Result<(), StorageError> {
        let mut scopes = self.store.scopes.write();
        let files = scopes
            .get_mut(scope)
            .ok_or_else(|| StorageError::NotFound { path: from.to_string() })?;
        let stored = files
            .remove(from)
            .ok_or_else(|| StorageError::NotFound { path: from.to_string() })?;
        files.insert(
            to.to_string(),
            StoredFile {
                file: stored.file.relocated(to),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn copy_file(&self, scope: &ScopeId, from: &str, to: &str) -> Result<(), StorageError> {
        let mut scopes = self.store.scopes.write();
        let files = scopes
            .get_mut(scope)
            .ok_or_else(|| StorageError::NotFound { path: from.to_string() })?;
        let file = files
            .get(from)
            .map(|stored| stored.file.relocated(to))
            .ok_or_else(|| StorageError::NotFound { path: from.to_string() })?;
        files.insert(
            to.to_string(),
            StoredFile {
                file,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }
}
