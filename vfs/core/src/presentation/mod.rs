// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`studio-vfs-core`)
//!
//! Boundary that agent tool executions call into. Failures are returned as
//! `{ "error": .. }` values instead of crossing the boundary as errors.
//!
//! | Module | Surface | Description |
//! |--------|---------|-------------|
//! | [`tool`] | JSON tool calls | `read_file`, `write_file`, `delete_file`, `list_files`, `move_file`, `copy_file` |

pub mod tool;

pub use tool::{ToolCall, VfsTool};
