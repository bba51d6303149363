// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Backend Trait - Anti-Corruption Layer for file persistence
//!
//! Abstracts the medium that holds [`VFile`] records (process memory, a
//! Postgres table, a remote document store) so the façade never sees
//! driver-specific types.
//!
//! Contract shared by every implementation:
//! - `read` returns `Ok(None)` for a missing path, never an error
//! - `write` upserts by (scope, path)
//! - `delete` is idempotent; `recursive` also removes `path + "/"` descendants
//! - `list` of an empty scope is an empty vector
//! - any driver failure is wrapped in [`StorageError::OperationFailed`]

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::BoxError;
use crate::domain::file::{FileInfo, ScopeId, VFile};

/// Options for [`StorageBackend::delete`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub recursive: bool,
}

impl DeleteOptions {
    pub fn recursive() -> Self {
        Self { recursive: true }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Read a file, `None` when absent
    async fn read(&self, scope: &ScopeId, path: &str) -> Result<Option<VFile>, StorageError>;

    /// Create or replace the record at `file.path`
    async fn write(&self, scope: &ScopeId, file: VFile) -> Result<(), StorageError>;

    /// Remove a path (and its descendants when recursive)
    async fn delete(&self, scope: &ScopeId, path: &str, options: DeleteOptions) -> Result<(), StorageError>;

    /// All records in the scope, sorted by path
    async fn list(&self, scope: &ScopeId) -> Result<Vec<FileInfo>, StorageError>;

    /// Native move. Backends without one keep this default and let the
    /// façade decide whether to emulate it.
    async fn move_file(&self, scope: &ScopeId, from: &str, to: &str) -> Result<(), StorageError> {
        let _ = (scope, to);
        Err(StorageError::Unsupported {
            path: from.to_string(),
            operation: "move_file",
        })
    }

    /// Native copy, see [`StorageBackend::move_file`]
    async fn copy_file(&self, scope: &ScopeId, from: &str, to: &str) -> Result<(), StorageError> {
        let _ = (scope, to);
        Err(StorageError::Unsupported {
            path: from.to_string(),
            operation: "copy_file",
        })
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Operation not supported: {operation} ({path})")]
    Unsupported {
        path: String,
        operation: &'static str,
    },

    #[error("Storage operation failed for {path}: {source}")]
    OperationFailed {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl StorageError {
    pub fn failed(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StorageError::OperationFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, StorageError::Unsupported { .. })
    }
}
