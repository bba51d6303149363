// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Virtual File System Façade
//!
//! One API over an injected [`StorageBackend`], bound to a single scope.
//! Two error conventions are offered as separate types and must not be
//! mixed by a caller:
//!
//! - [`VirtualFileSystemStrict`]: a missing file on read is a
//!   `FILE_NOT_FOUND` error and `description` round-trips.
//! - [`VirtualFileSystemLenient`]: a missing file on read yields a synthetic
//!   `text/plain` [`FileView`] reading "Error: File not found: <path>", and
//!   `description` is stripped from every read.
//!
//! Both validate every path before the backend is called and translate
//! every [`StorageError`] into a [`VfsError`]. Move and copy use the
//! backend's native implementation when it has one; otherwise the
//! [`TransferMode`] decides between the non-atomic saga in
//! [`crate::application::transfer`] and `OPERATION_NOT_SUPPORTED`.
//!
//! [`StorageError`]: crate::domain::storage::StorageError

use std::sync::Arc;

use crate::application::transfer::{LoggingReconcileHook, ReconcileHook, TransferKind, TransferSaga};
use crate::domain::config::TransferMode;
use crate::domain::error::VfsError;
use crate::domain::file::{FileInfo, FileView, ScopeId, VFile};
use crate::domain::path_validator::PathValidator;
use crate::domain::storage::{DeleteOptions, StorageBackend};

/// Assembles either façade variant
pub struct VfsBuilder {
    backend: Arc<dyn StorageBackend>,
    scope: ScopeId,
    validator: PathValidator,
    transfer: TransferMode,
    reconcile_hook: Arc<dyn ReconcileHook>,
}

impl VfsBuilder {
    pub fn new(backend: Arc<dyn StorageBackend>, scope: ScopeId) -> Self {
        Self {
            backend,
            scope,
            validator: PathValidator::new(),
            transfer: TransferMode::default(),
            reconcile_hook: Arc::new(LoggingReconcileHook),
        }
    }

    pub fn validator(mut self, validator: PathValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn max_path_length(self, max_length: usize) -> Self {
        self.validator(PathValidator::with_max_length(max_length))
    }

    pub fn transfer_mode(mut self, mode: TransferMode) -> Self {
        self.transfer = mode;
        self
    }

    pub fn reconcile_hook(mut self, hook: Arc<dyn ReconcileHook>) -> Self {
        self.reconcile_hook = hook;
        self
    }

    pub fn build_strict(self) -> VirtualFileSystemStrict {
        VirtualFileSystemStrict { core: self.into_core() }
    }

    pub fn build_lenient(self) -> VirtualFileSystemLenient {
        VirtualFileSystemLenient { core: self.into_core() }
    }

    fn into_core(self) -> VfsCore {
        VfsCore {
            backend: self.backend,
            scope: self.scope,
            validator: self.validator,
            transfer: self.transfer,
            reconcile_hook: self.reconcile_hook,
        }
    }
}

/// Validation, error translation and transfer dispatch shared by both variants
struct VfsCore {
    backend: Arc<dyn StorageBackend>,
    scope: ScopeId,
    validator: PathValidator,
    transfer: TransferMode,
    reconcile_hook: Arc<dyn ReconcileHook>,
}

impl VfsCore {
    async fn read(&self, path: &str) -> Result<Option<VFile>, VfsError> {
        self.validator.validate(path)?;
        tracing::debug!(backend = self.backend.name(), scope = %self.scope, path = %path, "read_file");
        Ok(self.backend.read(&self.scope, path).await?)
    }

    async fn write(&self, file: VFile) -> Result<(), VfsError> {
        self.validator.validate(&file.path)?;
        tracing::debug!(
            backend = self.backend.name(),
            scope = %self.scope,
            path = %file.path,
            size = file.size(),
            "write_file"
        );
        Ok(self.backend.write(&self.scope, file).await?)
    }

    async fn delete(&self, path: &str, options: DeleteOptions) -> Result<(), VfsError> {
        self.validator.validate(path)?;
        if options.recursive {
            tracing::info!(backend = self.backend.name(), scope = %self.scope, path = %path, "Recursive delete");
        } else {
            tracing::debug!(backend = self.backend.name(), scope = %self.scope, path = %path, "delete_file");
        }
        Ok(self.backend.delete(&self.scope, path, options).await?)
    }

    async fn list(&self) -> Result<Vec<FileInfo>, VfsError> {
        tracing::debug!(backend = self.backend.name(), scope = %self.scope, "list_files");
        Ok(self.backend.list(&self.scope).await?)
    }

    async fn transfer(&self, kind: TransferKind, from: &str, to: &str) -> Result<(), VfsError> {
        self.validator.validate(from)?;
        self.validator.validate(to)?;

        let native = match kind {
            TransferKind::Move => self.backend.move_file(&self.scope, from, to).await,
            TransferKind::Copy => self.backend.copy_file(&self.scope, from, to).await,
        };

        match native {
            Ok(()) => {
                tracing::debug!(scope = %self.scope, from = %from, to = %to, "Native {}", kind);
                Ok(())
            }
            Err(e) if e.is_unsupported() => match self.transfer {
                TransferMode::NativeOnly => Err(VfsError::not_supported(from, kind.operation())),
                TransferMode::Emulate => {
                    tracing::debug!(
                        backend = self.backend.name(),
                        scope = %self.scope,
                        "No native {}, running read/write saga",
                        kind
                    );
                    TransferSaga::new(self.backend.as_ref(), self.reconcile_hook.as_ref(), &self.scope)
                        .run(kind, from, to)
                        .await
                }
            },
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Strict Variant
// ============================================================================

/// Throwing convention: every failure, including "not found", is an error
pub struct VirtualFileSystemStrict {
    core: VfsCore,
}

impl VirtualFileSystemStrict {
    pub fn new(backend: Arc<dyn StorageBackend>, scope: ScopeId) -> Self {
        VfsBuilder::new(backend, scope).build_strict()
    }

    pub fn scope(&self) -> &ScopeId {
        &self.core.scope
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.core.backend
    }

    /// Read a file; `FILE_NOT_FOUND` when absent
    pub async fn read_file(&self, path: &str) -> Result<VFile, VfsError> {
        self.core
            .read(path)
            .await?
            .ok_or_else(|| VfsError::file_not_found(path))
    }

    pub async fn write_file(&self, file: VFile) -> Result<(), VfsError> {
        self.core.write(file).await
    }

    pub async fn delete_file(&self, path: &str, options: DeleteOptions) -> Result<(), VfsError> {
        self.core.delete(path, options).await
    }

    pub async fn list_files(&self) -> Result<Vec<FileInfo>, VfsError> {
        self.core.list().await
    }

    pub async fn move_file(&self, from: &str, to: &str) -> Result<(), VfsError> {
        self.core.transfer(TransferKind::Move, from, to).await
    }

    pub async fn copy_file(&self, from: &str, to: &str) -> Result<(), VfsError> {
        self.core.transfer(TransferKind::Copy, from, to).await
    }
}

// ============================================================================
// Lenient Variant
// ============================================================================

/// Result-returning convention for agent tools
pub struct VirtualFileSystemLenient {
    core: VfsCore,
}

impl VirtualFileSystemLenient {
    pub fn new(backend: Arc<dyn StorageBackend>, scope: ScopeId) -> Self {
        VfsBuilder::new(backend, scope).build_lenient()
    }

    pub fn scope(&self) -> &ScopeId {
        &self.core.scope
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.core.backend
    }

    /// Read a file without its description.
    ///
    /// A missing file is not an error: the placeholder from
    /// [`FileView::not_found`] is returned instead. Invalid paths and backend
    /// failures are still errors.
    pub async fn read_file(&self, path: &str) -> Result<FileView, VfsError> {
        match self.core.read(path).await? {
            Some(file) => Ok(FileView::from(file)),
            None => {
                tracing::debug!(scope = %self.core.scope, path = %path, "Read of missing file");
                Ok(FileView::not_found(path))
            }
        }
    }

    pub async fn write_file(&self, file: VFile) -> Result<(), VfsError> {
        self.core.write(file).await
    }

    pub async fn delete_file(&self, path: &str, options: DeleteOptions) -> Result<(), VfsError> {
        self.core.delete(path, options).await
    }

    pub async fn list_files(&self) -> Result<Vec<FileInfo>, VfsError> {
        self.core.list().await
    }

    pub async fn move_file(&self, from: &str, to: &str) -> Result<(), VfsError> {
        self.core.transfer(TransferKind::Move, from, to).await
    }

    pub async fn copy_file(&self, from: &str, to: &str) -> Result<(), VfsError> {
        self.core.transfer(TransferKind::Copy, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VfsErrorCode;
    use crate::domain::file::Metadata;
    use crate::domain::storage::StorageError;
    use crate::infrastructure::storage::InMemoryStorageBackend;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts backend calls and has no native move/copy
    #[derive(Default)]
    struct CountingBackend {
        inner: InMemoryStorageBackend,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn read(&self, scope: &ScopeId, path: &str) -> Result<Option<VFile>, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.read(scope, path).await
        }

        async fn write(&self, scope: &ScopeId, file: VFile) -> Result<(), StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.write(scope, file).await
        }

        async fn delete(&self, scope: &ScopeId, path: &str, options: DeleteOptions) -> Result<(), StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(scope, path, options).await
        }

        async fn list(&self, scope: &ScopeId) -> Result<Vec<FileInfo>, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list(scope).await
        }
    }

    fn scope() -> ScopeId {
        ScopeId::new("facade").unwrap()
    }

    #[tokio::test]
    async fn test_invalid_paths_never_reach_backend() {
        let backend = Arc::new(CountingBackend::default());
        let vfs = VirtualFileSystemStrict::new(backend.clone(), scope());
        let too_long = format!("/{}", "a".repeat(1000));

        for path in ["", "relative.txt", too_long.as_str()] {
            assert_eq!(vfs.read_file(path).await.unwrap_err().code, VfsErrorCode::InvalidPath);
            assert_eq!(
                vfs.write_file(VFile::new(path, "x")).await.unwrap_err().code,
                VfsErrorCode::InvalidPath
            );
            assert_eq!(
                vfs.delete_file(path, DeleteOptions::recursive()).await.unwrap_err().code,
                VfsErrorCode::InvalidPath
            );
            assert_eq!(vfs.move_file(path, "/ok").await.unwrap_err().code, VfsErrorCode::InvalidPath);
            assert_eq!(vfs.copy_file("/ok", path).await.unwrap_err().code, VfsErrorCode::InvalidPath);
        }

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_max_length() {
        let backend = Arc::new(InMemoryStorageBackend::isolated());
        let vfs = VfsBuilder::new(backend, scope()).max_path_length(8).build_lenient();

        assert!(vfs.write_file(VFile::new("/short", "x")).await.is_ok());
        let err = vfs.write_file(VFile::new("/too-long-path", "x")).await.unwrap_err();
        assert_eq!(err.code, VfsErrorCode::InvalidPath);
    }

    #[tokio::test]
    async fn test_strict_preserves_description() {
        let vfs = VirtualFileSystemStrict::new(Arc::new(InMemoryStorageBackend::isolated()), scope());
        vfs.write_file(VFile::new("/d.txt", "body").with_description("kept"))
            .await
            .unwrap();

        let file = vfs.read_file("/d.txt").await.unwrap();
        assert_eq!(file.description.as_deref(), Some("kept"));

        let err = vfs.read_file("/missing").await.unwrap_err();
        assert_eq!(err.code, VfsErrorCode::FileNotFound);
        assert_eq!(err.path, "/missing");
    }

    #[tokio::test]
    async fn test_lenient_placeholder_and_stripped_description() {
        let vfs = VirtualFileSystemLenient::new(Arc::new(InMemoryStorageBackend::isolated()), scope());
        let mut metadata = Metadata::new();
        metadata.insert("created".to_string(), serde_json::json!("2023-01-01"));
        vfs.write_file(
            VFile::new("/d.txt", "body")
                .with_description("hidden")
                .with_metadata(metadata),
        )
        .await
        .unwrap();

        let view = vfs.read_file("/d.txt").await.unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["metadata"]["created"], "2023-01-01");

        let missing = vfs.read_file("/missing").await.unwrap();
        assert_eq!(missing.content, "Error: File not found: /missing");
        assert_eq!(missing.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_emulated_transfer_without_native_support() {
        let backend = Arc::new(CountingBackend::default());
        let vfs = VirtualFileSystemStrict::new(backend, scope());
        vfs.write_file(VFile::new("/x", "payload")).await.unwrap();

        vfs.move_file("/x", "/y").await.unwrap();
        assert!(vfs.read_file("/x").await.unwrap_err().is_not_found());
        assert_eq!(vfs.read_file("/y").await.unwrap().content, "payload");
    }

    #[tokio::test]
    async fn test_native_only_surfaces_not_supported() {
        let backend = Arc::new(CountingBackend::default());
        let vfs = VfsBuilder::new(backend, scope())
            .transfer_mode(TransferMode::NativeOnly)
            .build_strict();
        vfs.write_file(VFile::new("/x", "payload")).await.unwrap();

        let err = vfs.copy_file("/x", "/y").await.unwrap_err();
        assert_eq!(err.code, VfsErrorCode::OperationNotSupported);
        assert!(vfs.read_file("/y").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_native_move_of_missing_source() {
        let vfs = VirtualFileSystemLenient::new(Arc::new(InMemoryStorageBackend::isolated()), scope());
        let err = vfs.move_file("/nope", "/y").await.unwrap_err();
        assert_eq!(err.code, VfsErrorCode::FileNotFound);
    }
}
