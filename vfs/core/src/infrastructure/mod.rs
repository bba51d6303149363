// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod storage;
pub mod blob;

pub use blob::OpendalBlobStore;
pub use db::Database;
