// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent tool boundary over the lenient façade.
//!
//! Call shape: `{ "tool": "<name>", ..arguments }`. Results:
//! - `read_file` → `{ "file": FileView }`
//! - `list_files` → `{ "files": [FileInfo] }`
//! - everything else → `{ "success": true }`
//! - any failure → `{ "error": "<message>", "code": "<VfsErrorCode>" }`

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::application::vfs::VirtualFileSystemLenient;
use crate::domain::error::VfsError;
use crate::domain::file::{Metadata, VFile};
use crate::domain::storage::DeleteOptions;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
        #[serde(default)]
        content: String,
        #[serde(default, rename = "contentType")]
        content_type: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        metadata: Option<Metadata>,
    },
    DeleteFile {
        path: String,
        #[serde(default)]
        recursive: bool,
    },
    ListFiles,
    MoveFile {
        from: String,
        to: String,
    },
    CopyFile {
        from: String,
        to: String,
    },
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ReadFile { .. } => "read_file",
            ToolCall::WriteFile { .. } => "write_file",
            ToolCall::DeleteFile { .. } => "delete_file",
            ToolCall::ListFiles => "list_files",
            ToolCall::MoveFile { .. } => "move_file",
            ToolCall::CopyFile { .. } => "copy_file",
        }
    }
}

pub struct VfsTool {
    vfs: Arc<VirtualFileSystemLenient>,
}

impl VfsTool {
    pub fn new(vfs: Arc<VirtualFileSystemLenient>) -> Self {
        Self { vfs }
    }

    pub async fn execute(&self, call: ToolCall) -> Value {
        let tool = call.name();
        match self.dispatch(call).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(tool, code = %e.code, path = %e.path, "Tool call failed: {}", e);
                error_value(&e)
            }
        }
    }

    /// Execute raw JSON arguments, checking path arguments before decoding
    pub async fn execute_json(&self, call: Value) -> Value {
        if let Some(err) = path_argument_error(&call) {
            return error_value(&err);
        }

        match serde_json::from_value::<ToolCall>(call) {
            Ok(call) => self.execute(call).await,
            Err(e) => json!({ "error": format!("Invalid tool call: {}", e) }),
        }
    }

    async fn dispatch(&self, call: ToolCall) -> Result<Value, VfsError> {
        match call {
            ToolCall::ReadFile { path } => {
                let file = self.vfs.read_file(&path).await?;
                Ok(json!({ "file": file }))
            }
            ToolCall::WriteFile {
                path,
                content,
                content_type,
                description,
                metadata,
            } => {
                let file = VFile {
                    path,
                    content,
                    content_type,
                    description,
                    metadata,
                };
                self.vfs.write_file(file).await?;
                Ok(json!({ "success": true }))
            }
            ToolCall::DeleteFile { path, recursive } => {
                self.vfs.delete_file(&path, DeleteOptions { recursive }).await?;
                Ok(json!({ "success": true }))
            }
            ToolCall::ListFiles => {
                let files = self.vfs.list_files().await?;
                Ok(json!({ "files": files }))
            }
            ToolCall::MoveFile { from, to } => {
                self.vfs.move_file(&from, &to).await?;
                Ok(json!({ "success": true }))
            }
            ToolCall::CopyFile { from, to } => {
                self.vfs.copy_file(&from, &to).await?;
                Ok(json!({ "success": true }))
            }
        }
    }
}

fn error_value(err: &VfsError) -> Value {
    json!({ "error": err.message, "code": err.code })
}

/// `INVALID_PATH` for a path argument that is missing or not a string
fn path_argument_error(call: &Value) -> Option<VfsError> {
    let fields: &[&str] = match call.get("tool").and_then(Value::as_str)? {
        "read_file" | "write_file" | "delete_file" => &["path"],
        "move_file" | "copy_file" => &["from", "to"],
        _ => return None,
    };

    fields.iter().find_map(|field| match call.get(*field) {
        Some(Value::String(_)) => None,
        Some(_) => Some(VfsError::invalid_path("", &format!("'{}' must be a string", field))),
        None => Some(VfsError::invalid_path("", &format!("'{}' is required", field))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file::ScopeId;
    use crate::infrastructure::storage::InMemoryStorageBackend;

    fn tool() -> VfsTool {
        let vfs = VirtualFileSystemLenient::new(
            Arc::new(InMemoryStorageBackend::isolated()),
            ScopeId::new("tool").unwrap(),
        );
        VfsTool::new(Arc::new(vfs))
    }

    #[test]
    fn test_call_decoding() {
        let call: ToolCall = serde_json::from_value(json!({
            "tool": "write_file",
            "path": "/a.txt",
            "content": "hi",
            "contentType": "text/plain"
        }))
        .unwrap();
        assert_eq!(call.name(), "write_file");
        assert!(matches!(call, ToolCall::WriteFile { content_type: Some(ref ct), .. } if ct == "text/plain"));

        let call: ToolCall = serde_json::from_value(json!({ "tool": "list_files" })).unwrap();
        assert_eq!(call, ToolCall::ListFiles);
    }

    #[test]
    fn test_path_argument_checks() {
        assert!(path_argument_error(&json!({ "tool": "read_file", "path": "/a" })).is_none());
        assert!(path_argument_error(&json!({ "tool": "list_files" })).is_none());

        let err = path_argument_error(&json!({ "tool": "read_file", "path": 7 })).unwrap();
        assert_eq!(err.code, crate::domain::error::VfsErrorCode::InvalidPath);
        assert!(path_argument_error(&json!({ "tool": "move_file", "from": "/a" })).is_some());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let tool = tool();
        let written = tool
            .execute(ToolCall::WriteFile {
                path: "/notes.md".to_string(),
                content: "# hi".to_string(),
                content_type: Some("text/markdown".to_string()),
                description: Some("scratch".to_string()),
                metadata: None,
            })
            .await;
        assert_eq!(written, json!({ "success": true }));

        let read = tool
            .execute(ToolCall::ReadFile {
                path: "/notes.md".to_string(),
            })
            .await;
        assert_eq!(read["file"]["content"], "# hi");
        assert!(read["file"].get("description").is_none());
    }

    #[tokio::test]
    async fn test_failures_become_error_objects() {
        let tool = tool();

        let invalid = tool.execute_json(json!({ "tool": "delete_file", "path": "relative" })).await;
        assert_eq!(invalid["code"], "INVALID_PATH");
        assert!(invalid["error"].as_str().unwrap().contains("relative"));

        let missing = tool.execute_json(json!({ "tool": "move_file", "from": "/none", "to": "/b" })).await;
        assert_eq!(missing["code"], "FILE_NOT_FOUND");

        let unknown = tool.execute_json(json!({ "tool": "format_disk" })).await;
        assert!(unknown["error"].as_str().unwrap().starts_with("Invalid tool call"));
    }
}
