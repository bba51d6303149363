// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! OpenDAL Blob Store
//!
//! [`BlobStore`] over an `opendal::Operator`. The in-memory service backs
//! tests and local development; S3 (or any S3-compatible endpoint such as
//! MinIO) backs deployments.

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use opendal::{services, ErrorKind, Operator};

use crate::domain::blob::{BlobError, BlobReceipt, BlobStore};
use crate::domain::config::BlobConfig;

#[derive(Clone)]
pub struct OpendalBlobStore {
    operator: Operator,
    name: &'static str,
}

impl OpendalBlobStore {
    pub fn new(operator: Operator, name: &'static str) -> Self {
        Self { operator, name }
    }

    /// Volatile store, one per call
    pub fn memory() -> anyhow::Result<Self> {
        let operator = Operator::new(services::Memory::default())
            .context("Failed to build in-memory blob store")?
            .finish();
        Ok(Self::new(operator, "memory"))
    }

    pub fn s3(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        root: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut builder = services::S3::default().bucket(bucket).region(region);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(key) = access_key_id {
            builder = builder.access_key_id(key);
        }
        if let Some(secret) = secret_access_key {
            builder = builder.secret_access_key(secret);
        }
        if let Some(root) = root {
            builder = builder.root(root);
        }

        let operator = Operator::new(builder)
            .with_context(|| format!("Failed to build S3 blob store for bucket '{}'", bucket))?
            .finish();
        Ok(Self::new(operator, "s3"))
    }

    pub fn from_config(config: &BlobConfig) -> anyhow::Result<Self> {
        match config {
            BlobConfig::Memory => Self::memory(),
            BlobConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                root,
            } => Self::s3(
                bucket,
                region,
                endpoint.as_deref(),
                access_key_id.as_deref(),
                secret_access_key.as_deref(),
                root.as_deref(),
            ),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

fn map_error(key: &str, error: opendal::Error) -> BlobError {
    if error.kind() == ErrorKind::NotFound {
        BlobError::NotFound { key: key.to_string() }
    } else {
        BlobError::failed(key, error)
    }
}

#[async_trait]
impl BlobStore for OpendalBlobStore {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<BlobReceipt, BlobError> {
        let size = data.len() as u64;

        let supports_content_type = self.operator.info().full_capability().write_with_content_type;
        match content_type.filter(|_| supports_content_type) {
            Some(content_type) => {
                self.operator
                    .write_with(key, data)
                    .content_type(content_type)
                    .await
                    .map_err(|e| map_error(key, e))?;
            }
            None => {
                self.operator.write(key, data).await.map_err(|e| map_error(key, e))?;
            }
        }

        // Not every service reports an etag; a failed stat only loses the etag
        let etag = match self.operator.stat(key).await {
            Ok(meta) => meta.etag().map(str::to_string),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Blob stat after upload failed");
                None
            }
        };

        tracing::debug!(store = self.name, key = %key, size, "Uploaded blob");
        Ok(BlobReceipt {
            key: key.to_string(),
            size,
            etag,
            uploaded_at: Utc::now(),
        })
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        let buffer = self.operator.read(key).await.map_err(|e| map_error(key, e))?;
        Ok(buffer.to_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.operator.delete(key).await.map_err(|e| map_error(key, e))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        let entries = match self.operator.list_with(prefix).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BlobError::failed(prefix, e)),
        };

        let mut keys: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.path().to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::failed(key, e)),
        }
    }
}
