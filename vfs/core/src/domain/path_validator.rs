// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Validator Domain Service
//!
//! Every façade operation that takes a path runs it through [`PathValidator`]
//! before touching a backend. Accepted paths are passed through unchanged:
//! `..`, duplicate slashes and trailing slashes are the caller's business.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Reject empty, relative and oversized paths; define the
//!   recursive-delete prefix boundary

use crate::domain::error::VfsError;

/// Maximum accepted path length, in characters
pub const MAX_PATH_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathValidator {
    max_path_len: usize,
}

impl PathValidator {
    pub fn new() -> Self {
        Self {
            max_path_len: MAX_PATH_LENGTH,
        }
    }

    pub fn with_max_length(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    pub fn max_length(&self) -> usize {
        self.max_path_len
    }

    /// Validate a path
    ///
    /// # Examples
    /// ```
    /// use studio_vfs_core::domain::path_validator::PathValidator;
    ///
    /// let validator = PathValidator::new();
    /// assert!(validator.validate("/notes/today.md").is_ok());
    /// assert!(validator.validate("notes/today.md").is_err());
    /// ```
    pub fn validate(&self, path: &str) -> Result<(), VfsError> {
        if path.is_empty() {
            return Err(VfsError::invalid_path(path, "path cannot be empty"));
        }

        if !path.starts_with('/') {
            tracing::warn!(path = %path, "Rejected relative path");
            return Err(VfsError::invalid_path(path, "path must be absolute"));
        }

        if path.chars().count() > self.max_path_len {
            tracing::warn!(
                length = path.chars().count(),
                max = self.max_path_len,
                "Rejected oversized path"
            );
            return Err(VfsError::invalid_path(
                path,
                &format!("path exceeds maximum length of {} characters", self.max_path_len),
            ));
        }

        Ok(())
    }
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursive-delete matcher.
///
/// `candidate` is inside `root` when it equals `root` or starts with
/// `root + "/"`, so `/ab` is not inside `/a`. A root that already ends with
/// `/` (including `/` itself) is used as the prefix as-is.
pub fn is_within(candidate: &str, root: &str) -> bool {
    if candidate == root {
        return true;
    }
    if root.ends_with('/') {
        return candidate.starts_with(root);
    }
    candidate
        .strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Prefix under which nested paths of `root` live.
pub fn child_prefix(root: &str) -> String {
    if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{}/", root)
    }
}
