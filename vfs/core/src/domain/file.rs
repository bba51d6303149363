// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! File Records
//!
//! Value types shared by every backend and façade:
//!
//! - [`VFile`] - a stored file record, unique per (scope, path)
//! - [`FileView`] - what the lenient façade hands back from a read (no description)
//! - [`FileInfo`] - a listing entry computed at `list()` time, never persisted
//! - [`ScopeId`] - the thread/project partition key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Open key/value bag attached to a file.
///
/// Media kinds attach different fields (dimensions, durations, blob keys), so
/// this is deliberately untyped.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the byte size of externally stored content.
pub const DECLARED_SIZE_KEY: &str = "blob_size";

/// Scope identifier errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Scope identifier cannot be empty")]
    Empty,
}

/// Partition key (thread or project id) under which all paths are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Result<Self, ScopeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ScopeError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored file record.
///
/// `content` is always text. Binary payloads live in a blob store and are
/// referenced from `metadata` (see `application::media_storage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VFile {
    /// Absolute path, unique within the scope
    pub path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Human-readable annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl VFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            content_type: None,
            description: None,
            metadata: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Same record under a different path.
    pub fn relocated(&self, path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..self.clone()
        }
    }

    /// Size reported in listings: the declared blob size when present,
    /// otherwise the byte length of `content`.
    pub fn size(&self) -> u64 {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(DECLARED_SIZE_KEY))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(self.content.len() as u64)
    }
}

/// A file as returned by the lenient façade's read: `description` is stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl FileView {
    /// Placeholder surfaced instead of a "not found" error.
    pub fn not_found(path: &str) -> Self {
        Self {
            path: path.to_string(),
            content: format!("Error: File not found: {}", path),
            content_type: Some("text/plain".to_string()),
            metadata: None,
        }
    }
}

impl From<VFile> for FileView {
    fn from(file: VFile) -> Self {
        Self {
            path: file.path,
            content: file.content,
            content_type: file.content_type,
            metadata: file.metadata,
        }
    }
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: String,
    /// Byte length of content, or declared size for blobs
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl FileInfo {
    pub fn from_file(file: &VFile, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: file.path.clone(),
            size: file.size(),
            last_modified,
            content_type: file.content_type.clone(),
            description: file.description.clone(),
            metadata: file.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_rejects_empty() {
        assert_eq!(ScopeId::new(""), Err(ScopeError::Empty));
        assert_eq!(ScopeId::new("thread-1").unwrap().as_str(), "thread-1");
    }

    #[test]
    fn test_size_prefers_declared_blob_size() {
        let mut metadata = Metadata::new();
        metadata.insert(DECLARED_SIZE_KEY.to_string(), json!(2048));
        let file = VFile::new("/img.png", "").with_metadata(metadata);
        assert_eq!(file.size(), 2048);

        let text = VFile::new("/a.txt", "héllo");
        assert_eq!(text.size(), 6);
    }

    #[test]
    fn test_file_view_drops_description() {
        let file = VFile::new("/a.txt", "x")
            .with_content_type("text/plain")
            .with_description("notes");
        let view = FileView::from(file);
        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("description").is_none());
        assert_eq!(value["contentType"], "text/plain");
    }

    #[test]
    fn test_not_found_placeholder() {
        let view = FileView::not_found("/missing.txt");
        assert_eq!(view.content, "Error: File not found: /missing.txt");
        assert_eq!(view.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_vfile_json_shape() {
        let file: VFile = serde_json::from_value(json!({
            "path": "/test.txt",
            "content": "Hello, World!",
            "contentType": "text/plain",
            "metadata": { "created": "2023-01-01" }
        }))
        .unwrap();
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
        assert_eq!(file.metadata.unwrap()["created"], "2023-01-01");
        assert!(file.description.is_none());
    }
}
