// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VFS Error Taxonomy
//!
//! | Code | Meaning | Retry |
//! |------|---------|-------|
//! | `INVALID_PATH` | malformed input, raised before any I/O | no, fix the path |
//! | `FILE_NOT_FOUND` | expected condition callers check for | no |
//! | `OPERATION_FAILED` | underlying medium failure, wraps a cause | maybe |
//! | `OPERATION_NOT_SUPPORTED` | backend lacks a native move/copy and emulation is off | no |

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::domain::storage::StorageError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VfsErrorCode {
    FileNotFound,
    InvalidPath,
    OperationFailed,
    OperationNotSupported,
}

impl VfsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VfsErrorCode::FileNotFound => "FILE_NOT_FOUND",
            VfsErrorCode::InvalidPath => "INVALID_PATH",
            VfsErrorCode::OperationFailed => "OPERATION_FAILED",
            VfsErrorCode::OperationNotSupported => "OPERATION_NOT_SUPPORTED",
        }
    }
}

impl fmt::Display for VfsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by the façades.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VfsError {
    pub code: VfsErrorCode,
    pub message: String,
    /// Offending path
    pub path: String,
    #[source]
    pub cause: Option<BoxError>,
}

impl VfsError {
    pub fn new(code: VfsErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
            cause: None,
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: &str) -> Self {
        let path = path.into();
        Self::new(
            VfsErrorCode::InvalidPath,
            format!("Invalid path '{}': {}", path, reason),
            path,
        )
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(VfsErrorCode::FileNotFound, format!("File not found: {}", path), path)
    }

    pub fn operation_failed(path: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        let path = path.into();
        let cause = cause.into();
        Self {
            code: VfsErrorCode::OperationFailed,
            message: format!("Operation failed for {}: {}", path, cause),
            path,
            cause: Some(cause),
        }
    }

    pub fn not_supported(path: impl Into<String>, operation: &str) -> Self {
        Self::new(
            VfsErrorCode::OperationNotSupported,
            format!("Operation not supported by storage backend: {}", operation),
            path,
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.code == VfsErrorCode::FileNotFound
    }

    /// Wire shape: `{ name, message, code, path, cause? }`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = json!({
            "name": "VFSError",
            "message": self.message,
            "code": self.code.as_str(),
            "path": self.path,
        });
        if let Some(cause) = &self.cause {
            value["cause"] = json!(cause.to_string());
        }
        value
    }
}

impl From<StorageError> for VfsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { path } => VfsError::file_not_found(path),
            StorageError::Unsupported { path, operation } => VfsError::not_supported(path, operation),
            StorageError::OperationFailed { path, source } => VfsError::operation_failed(path, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_json_shape() {
        let err = VfsError::file_not_found("/missing.txt");
        let value = err.to_json();
        assert_eq!(value["name"], "VFSError");
        assert_eq!(value["code"], "FILE_NOT_FOUND");
        assert_eq!(value["path"], "/missing.txt");
        assert!(value.get("cause").is_none());
    }

    #[test]
    fn test_operation_failed_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = VfsError::operation_failed("/a.txt", io);
        assert_eq!(err.code, VfsErrorCode::OperationFailed);
        assert!(err.source().is_some());
        assert_eq!(err.to_json()["cause"], "reset by peer");
    }

    #[test]
    fn test_storage_error_translation() {
        let err: VfsError = StorageError::NotFound { path: "/x".to_string() }.into();
        assert!(err.is_not_found());

        let err: VfsError = StorageError::Unsupported {
            path: "/x".to_string(),
            operation: "move_file",
        }
        .into();
        assert_eq!(err.code, VfsErrorCode::OperationNotSupported);
    }

    #[test]
    fn test_code_serialization() {
        let value = serde_json::to_value(VfsErrorCode::InvalidPath).unwrap();
        assert_eq!(value, "INVALID_PATH");
    }
}
