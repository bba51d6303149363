// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: file records, error taxonomy and the ports backends implement.

pub mod file;
pub mod error;
pub mod path_validator;
pub mod storage;
pub mod blob;
pub mod media;
pub mod config;

pub use file::{FileInfo, FileView, Metadata, ScopeError, ScopeId, VFile};
pub use error::{VfsError, VfsErrorCode};
pub use path_validator::{is_within, PathValidator, MAX_PATH_LENGTH};
pub use storage::{DeleteOptions, StorageBackend, StorageError};
