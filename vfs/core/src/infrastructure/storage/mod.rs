// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Storage backend adapters

pub mod memory;
pub mod postgres;
pub mod document;

pub use document::DocumentStorageBackend;
pub use memory::{InMemoryStorageBackend, MemoryStore};
pub use postgres::PostgresStorageBackend;
