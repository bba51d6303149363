// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Move/Copy Saga
//!
//! Used when a backend has no native move/copy. The steps are:
//!
//! 1. read the source (missing source is `FILE_NOT_FOUND`)
//! 2. write the record under the destination path
//! 3. delete the source (move only)
//!
//! Nothing spans the three steps. If step 3 fails the record exists at both
//! paths; that state is handed to a [`ReconcileHook`] and the operation
//! fails with `OPERATION_FAILED`. No automatic repair is attempted.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::domain::error::VfsError;
use crate::domain::file::ScopeId;
use crate::domain::storage::{DeleteOptions, StorageBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Move,
    Copy,
}

impl TransferKind {
    /// Operation name used in errors and logs
    pub fn operation(&self) -> &'static str {
        match self {
            TransferKind::Move => "move_file",
            TransferKind::Copy => "copy_file",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// A move whose destination was written but whose source survived
#[derive(Debug, Clone, Serialize)]
pub struct PartialTransfer {
    pub scope: ScopeId,
    pub kind: TransferKind,
    pub from: String,
    pub to: String,
    pub error: String,
}

/// Extension point for repairing interrupted transfers
#[async_trait]
pub trait ReconcileHook: Send + Sync {
    async fn on_partial_transfer(&self, partial: &PartialTransfer);
}

/// Default hook: record the duplicate in the logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReconcileHook;

#[async_trait]
impl ReconcileHook for LoggingReconcileHook {
    async fn on_partial_transfer(&self, partial: &PartialTransfer) {
        tracing::warn!(
            scope = %partial.scope,
            from = %partial.from,
            to = %partial.to,
            error = %partial.error,
            "{} left the record at both paths",
            partial.kind
        );
    }
}

pub struct TransferSaga<'a> {
    backend: &'a dyn StorageBackend,
    hook: &'a dyn ReconcileHook,
    scope: &'a ScopeId,
}

impl<'a> TransferSaga<'a> {
    pub fn new(backend: &'a dyn StorageBackend, hook: &'a dyn ReconcileHook, scope: &'a ScopeId) -> Self {
        Self { backend, hook, scope }
    }

    pub async fn run(&self, kind: TransferKind, from: &str, to: &str) -> Result<(), VfsError> {
        let source = self
            .backend
            .read(self.scope, from)
            .await?
            .ok_or_else(|| VfsError::file_not_found(from))?;

        if from == to {
            return Ok(());
        }

        self.backend.write(self.scope, source.relocated(to)).await?;
        tracing::debug!(scope = %self.scope, from = %from, to = %to, "{}: destination written", kind);

        if kind == TransferKind::Copy {
            return Ok(());
        }

        if let Err(e) = self.backend.delete(self.scope, from, DeleteOptions::default()).await {
            let partial = PartialTransfer {
                scope: self.scope.clone(),
                kind,
                from: from.to_string(),
                to: to.to_string(),
                error: e.to_string(),
            };
            self.hook.on_partial_transfer(&partial).await;
            return Err(VfsError::operation_failed(from, e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VfsErrorCode;
    use crate::domain::file::{FileInfo, VFile};
    use crate::domain::storage::StorageError;
    use crate::infrastructure::storage::InMemoryStorageBackend;
    use parking_lot::Mutex;

    /// Memory backend whose deletes always fail
    struct StickyBackend {
        inner: InMemoryStorageBackend,
    }

    #[async_trait]
    impl StorageBackend for StickyBackend {
        fn name(&self) -> &'static str {
            "sticky"
        }

        async fn read(&self, scope: &ScopeId, path: &str) -> Result<Option<VFile>, StorageError> {
            self.inner.read(scope, path).await
        }

        async fn write(&self, scope: &ScopeId, file: VFile) -> Result<(), StorageError> {
            self.inner.write(scope, file).await
        }

        async fn delete(&self, _scope: &ScopeId, path: &str, _options: DeleteOptions) -> Result<(), StorageError> {
            Err(StorageError::failed(path, "disk is read-only"))
        }

        async fn list(&self, scope: &ScopeId) -> Result<Vec<FileInfo>, StorageError> {
            self.inner.list(scope).await
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        seen: Mutex<Vec<PartialTransfer>>,
    }

    #[async_trait]
    impl ReconcileHook for RecordingHook {
        async fn on_partial_transfer(&self, partial: &PartialTransfer) {
            self.seen.lock().push(partial.clone());
        }
    }

    fn scope() -> ScopeId {
        ScopeId::new("saga").unwrap()
    }

    #[tokio::test]
    async fn test_move_and_copy() {
        let backend = InMemoryStorageBackend::isolated();
        let hook = LoggingReconcileHook;
        let s = scope();
        backend.write(&s, VFile::new("/x", "payload")).await.unwrap();

        let saga = TransferSaga::new(&backend, &hook, &s);
        saga.run(TransferKind::Copy, "/x", "/y").await.unwrap();
        saga.run(TransferKind::Move, "/x", "/z").await.unwrap();

        assert!(backend.read(&s, "/x").await.unwrap().is_none());
        assert_eq!(backend.read(&s, "/y").await.unwrap().unwrap().path, "/y");
        assert_eq!(backend.read(&s, "/z").await.unwrap().unwrap().content, "payload");
    }

    #[tokio::test]
    async fn test_missing_source() {
        let backend = InMemoryStorageBackend::isolated();
        let hook = LoggingReconcileHook;
        let s = scope();

        let err = TransferSaga::new(&backend, &hook, &s)
            .run(TransferKind::Move, "/missing", "/y")
            .await
            .unwrap_err();
        assert_eq!(err.code, VfsErrorCode::FileNotFound);
        assert_eq!(err.path, "/missing");
    }

    #[tokio::test]
    async fn test_self_transfer_is_noop() {
        let backend = InMemoryStorageBackend::isolated();
        let hook = LoggingReconcileHook;
        let s = scope();
        backend.write(&s, VFile::new("/x", "payload")).await.unwrap();

        TransferSaga::new(&backend, &hook, &s)
            .run(TransferKind::Move, "/x", "/x")
            .await
            .unwrap();
        assert_eq!(backend.read(&s, "/x").await.unwrap().unwrap().content, "payload");
    }

    #[tokio::test]
    async fn test_failed_source_delete_reports_partial_transfer() {
        let backend = StickyBackend {
            inner: InMemoryStorageBackend::isolated(),
        };
        let hook = RecordingHook::default();
        let s = scope();
        backend.write(&s, VFile::new("/x", "payload")).await.unwrap();

        let err = TransferSaga::new(&backend, &hook, &s)
            .run(TransferKind::Move, "/x", "/y")
            .await
            .unwrap_err();
        assert_eq!(err.code, VfsErrorCode::OperationFailed);

        // Both copies survive
        assert!(backend.read(&s, "/x").await.unwrap().is_some());
        assert!(backend.read(&s, "/y").await.unwrap().is_some());

        let seen = hook.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].from, "/x");
        assert_eq!(seen[0].to, "/y");
        assert_eq!(seen[0].kind, TransferKind::Move);
    }
}
