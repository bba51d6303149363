// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Studio VFS Core
//!
//! Scoped virtual file system used by agent tools to persist text files and
//! generated media.
//!
//! # Architecture
//!
//! - **Domain:** file records, errors, path validation, storage and blob ports
//! - **Application:** strict/lenient façades, transfer saga, media storage
//! - **Infrastructure:** in-memory, Postgres and document-API backends, opendal blobs
//! - **Presentation:** agent tool boundary

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::vfs::{VfsBuilder, VirtualFileSystemLenient, VirtualFileSystemStrict};
