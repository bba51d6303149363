// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Document Store Backend
//!
//! Keeps file records in a remote transactional document API (Convex-style
//! HTTP functions) keyed by (threadId, path).
//!
//! # API Endpoints
//!
//! - `POST /api/query` - `files:get`, `files:listByThread`, `files:listByPrefix`
//! - `POST /api/mutation` - `files:upsert`, `files:remove`
//!
//! Request body: `{ "path": "<function>", "args": {..}, "format": "json" }`.
//! Response body: `{ "status": "success", "value": .. }` or
//! `{ "status": "error", "errorMessage": ".." }`.
//!
//! The API has no bulk delete, so recursive delete lists the prefix and
//! removes documents one at a time. There is no native move/copy either.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::domain::file::{FileInfo, Metadata, ScopeId, VFile};
use crate::domain::path_validator::{child_prefix, is_within};
use crate::domain::storage::{DeleteOptions, StorageBackend, StorageError};

/// Document API adapter
pub struct DocumentStorageBackend {
    /// HTTP client for the document API
    client: Client,

    /// Deployment base URL (e.g., "https://happy-otter-123.convex.cloud")
    base_url: String,

    /// Deploy key sent as a bearer token
    token: Option<String>,
}

impl DocumentStorageBackend {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, token, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    /// Build full URL for API endpoint
    fn build_url(&self, kind: FunctionKind) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), kind.as_str())
    }

    /// Invoke a remote function and decode its value
    async fn call<T: DeserializeOwned>(
        &self,
        kind: FunctionKind,
        function: &str,
        args: serde_json::Value,
        path: &str,
    ) -> Result<T, StorageError> {
        let mut request = self.client.post(self.build_url(kind)).json(&FunctionRequest {
            path: function,
            args,
            format: "json",
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| StorageError::failed(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(StorageError::failed(
                path,
                format!("{} returned {}: {}", function, status, error_msg),
            ));
        }

        let body: FunctionResponse = response.json().await.map_err(|e| StorageError::failed(path, e))?;
        match body.status.as_str() {
            "success" => serde_json::from_value(body.value.unwrap_or(serde_json::Value::Null))
                .map_err(|e| StorageError::failed(path, e)),
            _ => Err(StorageError::failed(
                path,
                body.error_message
                    .unwrap_or_else(|| format!("{} failed without an error message", function)),
            )),
        }
    }

    async fn remove(&self, scope: &ScopeId, path: &str) -> Result<(), StorageError> {
        let _: serde_json::Value = self
            .call(
                FunctionKind::Mutation,
                "files:remove",
                json!({ "threadId": scope.as_str(), "path": path }),
                path,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for DocumentStorageBackend {
    fn name(&self) -> &'static str {
        "document"
    }

    async fn read(&self, scope: &ScopeId, path: &str) -> Result<Option<VFile>, StorageError> {
        let document: Option<FileDocument> = self
            .call(
                FunctionKind::Query,
                "files:get",
                json!({ "threadId": scope.as_str(), "path": path }),
                path,
            )
            .await?;
        Ok(document.map(FileDocument::into_file))
    }

    async fn write(&self, scope: &ScopeId, file: VFile) -> Result<(), StorageError> {
        let _: serde_json::Value = self
            .call(
                FunctionKind::Mutation,
                "files:upsert",
                json!({
                    "threadId": scope.as_str(),
                    "path": file.path,
                    "content": file.content,
                    "contentType": file.content_type,
                    "description": file.description,
                    "metadata": file.metadata,
                }),
                &file.path,
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, scope: &ScopeId, path: &str, options: DeleteOptions) -> Result<(), StorageError> {
        self.remove(scope, path).await?;
        if !options.recursive {
            return Ok(());
        }

        let nested: Vec<FileDocument> = self
            .call(
                FunctionKind::Query,
                "files:listByPrefix",
                json!({ "threadId": scope.as_str(), "prefix": child_prefix(path) }),
                path,
            )
            .await?;

        let mut removed = 0usize;
        for document in nested.iter().filter(|d| is_within(&d.path, path) && d.path != path) {
            self.remove(scope, &document.path).await?;
            removed += 1;
        }

        tracing::debug!(scope = %scope, path = %path, removed, "Recursive delete");
        Ok(())
    }

    async fn list(&self, scope: &ScopeId) -> Result<Vec<FileInfo>, StorageError> {
        let documents: Vec<FileDocument> = self
            .call(
                FunctionKind::Query,
                "files:listByThread",
                json!({ "threadId": scope.as_str() }),
                "/",
            )
            .await?;

        let mut files: Vec<FileInfo> = documents
            .into_iter()
            .map(|document| {
                let last_modified = document.last_modified();
                FileInfo::from_file(&document.into_file(), last_modified)
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

// ============================================================================
// Document API Wire Types
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum FunctionKind {
    Query,
    Mutation,
}

impl FunctionKind {
    fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Query => "query",
            FunctionKind::Mutation => "mutation",
        }
    }
}

#[derive(Debug, Serialize)]
struct FunctionRequest<'a> {
    path: &'a str,
    args: serde_json::Value,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct FunctionResponse {
    status: String,

    #[serde(default)]
    value: Option<serde_json::Value>,

    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDocument {
    path: String,

    #[serde(default)]
    content: String,

    #[serde(default)]
    content_type: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    metadata: Option<Metadata>,

    /// Milliseconds since epoch
    #[serde(default, rename = "_creationTime")]
    creation_time: Option<f64>,

    /// Milliseconds since epoch
    #[serde(default)]
    updated_at: Option<f64>,
}

impl FileDocument {
    fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at
            .or(self.creation_time)
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .unwrap_or_else(Utc::now)
    }

    fn into_file(self) -> VFile {
        VFile {
            path: self.path,
            content: self.content,
            content_type: self.content_type,
            description: self.description,
            metadata: self.metadata,
        }
    }
}
