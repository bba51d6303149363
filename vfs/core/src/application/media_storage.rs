// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Media File Storage Application Service
//!
//! Persists binary payloads in two steps:
//! - the bytes go to a [`BlobStore`] under `media/<scope>/<path>`
//! - a companion [`VFile`] with empty content goes to the [`StorageBackend`],
//!   its metadata carrying the blob key, the upload receipt and the
//!   kind-specific fields (dimensions, duration)
//!
//! The two writes are not coordinated. The record is the source of truth:
//! a blob without a record is an orphan and [`MediaFileStorage::reconcile`]
//! removes it; a record without a blob is reported as dangling.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::blob::BlobStore;
use crate::domain::error::{VfsError, VfsErrorCode};
use crate::domain::file::{Metadata, ScopeId, VFile};
use crate::domain::media::{
    blob_key_of, media_metadata, AudioInfo, ImageInfo, MediaKind, MediaPayload, VideoInfo, BLOB_KEY,
};
use crate::domain::path_validator::PathValidator;
use crate::domain::storage::{DeleteOptions, StorageBackend};

const BLOB_ROOT: &str = "media";

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Blob keys deleted because no record referenced them
    pub orphaned_blobs_removed: Vec<String>,
    /// Record paths whose blob is missing
    pub dangling_records: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_blobs_removed.is_empty() && self.dangling_records.is_empty()
    }
}

pub struct MediaFileStorage {
    blob_store: Arc<dyn BlobStore>,
    backend: Arc<dyn StorageBackend>,
    scope: ScopeId,
    validator: PathValidator,
}

impl MediaFileStorage {
    pub fn new(blob_store: Arc<dyn BlobStore>, backend: Arc<dyn StorageBackend>, scope: ScopeId) -> Self {
        Self {
            blob_store,
            backend,
            scope,
            validator: PathValidator::new(),
        }
    }

    pub fn with_validator(mut self, validator: PathValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// Deterministic blob key for `(scope, path)`.
    ///
    /// `%` and `/` in the scope are percent-encoded so that distinct scopes
    /// never share a key prefix. The path loses exactly one leading `/`;
    /// each of its segments has `%` encoded, and empty, `.` and `..`
    /// segments are replaced by escapes, so that every path maps to its own
    /// key and no key collapses under object-store path normalization.
    pub fn blob_key(scope: &ScopeId, path: &str) -> String {
        let relative = path.strip_prefix('/').unwrap_or(path);
        let encoded: Vec<String> = relative.split('/').map(encode_segment).collect();
        format!("{}{}", Self::scope_prefix(scope), encoded.join("/"))
    }

    fn scope_prefix(scope: &ScopeId) -> String {
        let encoded = scope.as_str().replace('%', "%25").replace('/', "%2F");
        format!("{}/{}/", BLOB_ROOT, encoded)
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    pub async fn save_image(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        info: ImageInfo,
    ) -> Result<VFile, VfsError> {
        self.save_media(path, bytes, content_type, MediaKind::Image, info.into_metadata())
            .await
    }

    pub async fn save_audio(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        info: AudioInfo,
    ) -> Result<VFile, VfsError> {
        self.save_media(path, bytes, content_type, MediaKind::Audio, info.into_metadata())
            .await
    }

    pub async fn save_video(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        info: VideoInfo,
    ) -> Result<VFile, VfsError> {
        self.save_media(path, bytes, content_type, MediaKind::Video, info.into_metadata())
            .await
    }

    /// Upload the blob, then write the record
    pub async fn save_media(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        kind: MediaKind,
        extra: Metadata,
    ) -> Result<VFile, VfsError> {
        self.validator.validate(path)?;
        let key = Self::blob_key(&self.scope, path);

        let receipt = self
            .blob_store
            .put(&key, bytes, Some(content_type))
            .await
            .map_err(|e| VfsError::operation_failed(path, e))?;

        let file = VFile::new(path, "")
            .with_content_type(content_type)
            .with_metadata(media_metadata(kind, &receipt, extra));

        if let Err(e) = self.backend.write(&self.scope, file.clone()).await {
            tracing::warn!(
                scope = %self.scope,
                path = %path,
                key = %key,
                "Record write failed after blob upload, blob is orphaned until reconciliation"
            );
            return Err(e.into());
        }

        tracing::info!(
            scope = %self.scope,
            path = %path,
            kind = kind.as_str(),
            size = receipt.size,
            "Saved media file"
        );
        Ok(file)
    }

    /// Read the record, then download its blob
    pub async fn read_media(&self, path: &str) -> Result<MediaPayload, VfsError> {
        self.validator.validate(path)?;

        let file = self
            .backend
            .read(&self.scope, path)
            .await?
            .ok_or_else(|| VfsError::file_not_found(path))?;

        let key = blob_key_of(&file)
            .ok_or_else(|| {
                VfsError::new(
                    VfsErrorCode::OperationFailed,
                    format!("Not a media file: {}", path),
                    path,
                )
            })?
            .to_string();

        let bytes = self
            .blob_store
            .get(&key)
            .await
            .map_err(|e| VfsError::operation_failed(path, e))?;

        Ok(MediaPayload { file, bytes })
    }

    /// Delete the record, then its blob.
    ///
    /// The blob is kept while another record (a copy) still references it.
    /// Deleting a missing path succeeds.
    pub async fn delete_media(&self, path: &str) -> Result<(), VfsError> {
        self.validator.validate(path)?;

        let Some(file) = self.backend.read(&self.scope, path).await? else {
            return Ok(());
        };

        self.backend
            .delete(&self.scope, path, DeleteOptions::default())
            .await?;

        let Some(key) = blob_key_of(&file) else {
            return Ok(());
        };

        let still_referenced = self
            .backend
            .list(&self.scope)
            .await?
            .iter()
            .any(|info| referenced_key(info.metadata.as_ref()) == Some(key));
        if still_referenced {
            tracing::debug!(scope = %self.scope, path = %path, key = %key, "Blob shared with another record, kept");
            return Ok(());
        }

        self.blob_store.delete(key).await.map_err(|e| {
            tracing::warn!(scope = %self.scope, key = %key, "Blob delete failed, blob is orphaned");
            VfsError::operation_failed(path, e)
        })?;

        tracing::info!(scope = %self.scope, path = %path, "Deleted media file");
        Ok(())
    }

    /// Remove orphaned blobs and report dangling records
    pub async fn reconcile(&self) -> Result<ReconciliationReport, VfsError> {
        let prefix = Self::scope_prefix(&self.scope);

        let records = self.backend.list(&self.scope).await?;
        let blobs: HashSet<String> = self
            .blob_store
            .list(&prefix)
            .await
            .map_err(|e| VfsError::operation_failed(prefix.as_str(), e))?
            .into_iter()
            .collect();

        let referenced: HashSet<&str> = records
            .iter()
            .filter_map(|info| referenced_key(info.metadata.as_ref()))
            .collect();

        let mut report = ReconciliationReport::default();

        for info in &records {
            if let Some(key) = referenced_key(info.metadata.as_ref()) {
                // Keys outside this scope's prefix are not listed, so check them directly
                let present = if key.starts_with(&prefix) {
                    blobs.contains(key)
                } else {
                    self.blob_store
                        .exists(key)
                        .await
                        .map_err(|e| VfsError::operation_failed(info.path.as_str(), e))?
                };
                if !present {
                    tracing::warn!(scope = %self.scope, path = %info.path, key = %key, "Dangling media record");
                    report.dangling_records.push(info.path.clone());
                }
            }
        }

        let mut orphans: Vec<&String> = blobs.iter().filter(|k| !referenced.contains(k.as_str())).collect();
        orphans.sort();
        for key in orphans {
            self.blob_store
                .delete(key)
                .await
                .map_err(|e| VfsError::operation_failed(key.as_str(), e))?;
            tracing::warn!(scope = %self.scope, key = %key, "Removed orphaned blob");
            report.orphaned_blobs_removed.push(key.clone());
        }

        tracing::info!(
            scope = %self.scope,
            orphaned = report.orphaned_blobs_removed.len(),
            dangling = report.dangling_records.len(),
            "Media reconciliation complete"
        );
        Ok(report)
    }
}

fn referenced_key(metadata: Option<&Metadata>) -> Option<&str> {
    metadata
        .and_then(|m| m.get(BLOB_KEY))
        .and_then(serde_json::Value::as_str)
}

/// One path segment of a blob key; `%` is always escaped, so the markers
/// below cannot be produced by any literal segment
fn encode_segment(segment: &str) -> String {
    match segment {
        "" => "%00".to_string(),
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        other => other.replace('%', "%25"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_key_layout() {
        let scope = ScopeId::new("thread-1").unwrap();
        assert_eq!(
            MediaFileStorage::blob_key(&scope, "/images/cat.png"),
            "media/thread-1/images/cat.png"
        );
    }

    #[test]
    fn test_blob_key_encodes_scope_separators() {
        let nested = ScopeId::new("org/thread").unwrap();
        let flat = ScopeId::new("org%2Fthread").unwrap();
        assert_eq!(MediaFileStorage::blob_key(&nested, "/a.png"), "media/org%2Fthread/a.png");
        assert_ne!(
            MediaFileStorage::blob_key(&nested, "/a.png"),
            MediaFileStorage::blob_key(&flat, "/a.png")
        );
    }

    #[test]
    fn test_blob_key_is_distinct_per_path() {
        let scope = ScopeId::new("s").unwrap();
        let key = |path: &str| MediaFileStorage::blob_key(&scope, path);

        assert_eq!(key("/a"), "media/s/a");
        assert_eq!(key("//a"), "media/s/%00/a");
        assert_eq!(key("/"), "media/s/%00");
        assert_eq!(key("/dir/"), "media/s/dir/%00");
        assert_eq!(key("/a/../b"), "media/s/a/%2E%2E/b");
        assert_eq!(key("/100%"), "media/s/100%25");
        assert_ne!(key("/%00"), key("//"));

        let keys: HashSet<String> = ["/a", "//a", "/a/", "/", "//", "/%00", "/./a", "/%2E/a"]
            .into_iter()
            .map(key)
            .collect();
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_report_is_clean() {
        assert!(ReconciliationReport::default().is_clean());
        let report = ReconciliationReport {
            orphaned_blobs_removed: vec!["media/t/a.png".to_string()],
            dangling_records: vec![],
        };
        assert!(!report.is_clean());
    }
}
