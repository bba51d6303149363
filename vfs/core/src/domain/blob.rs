// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Blob Store Trait
//!
//! Binary payloads (images, audio, video) never go into a [`VFile`]'s text
//! content. They are written to a blob store under a deterministic key and
//! the file record only carries the key and the upload receipt.
//!
//! [`VFile`]: crate::domain::file::VFile

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::error::BoxError;

/// What the blob store reported back after an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobReceipt {
    pub key: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upload (or overwrite) `key`
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<BlobReceipt, BlobError>;

    /// Download `key`; [`BlobError::NotFound`] when absent
    async fn get(&self, key: &str) -> Result<Bytes, BlobError>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Every key under `prefix`, recursively
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError>;

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(BlobError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Blob store errors
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {key}")]
    NotFound { key: String },

    #[error("Blob operation failed for {key}: {source}")]
    OperationFailed {
        key: String,
        #[source]
        source: BoxError,
    },
}

impl BlobError {
    pub fn failed(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        BlobError::OperationFailed {
            key: key.into(),
            source: source.into(),
        }
    }
}
