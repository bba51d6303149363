// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod vfs;
pub mod transfer;
pub mod media_storage;
pub mod quadrant;
pub mod backend_factory;

pub use media_storage::{MediaFileStorage, ReconciliationReport};
pub use quadrant::{QuadrantError, QuadrantSplitter};
pub use transfer::{LoggingReconcileHook, PartialTransfer, ReconcileHook, TransferKind};
pub use vfs::{VfsBuilder, VirtualFileSystemLenient, VirtualFileSystemStrict};
