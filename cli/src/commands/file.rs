// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File commands
//!
//! Commands: read, write, rm, ls, mv, cp
//!
//! `read` follows `spec.facade.read_mode`: in lenient mode a missing file
//! prints the "Error: File not found" placeholder and exits successfully.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;

use studio_vfs_core::application::backend_factory;
use studio_vfs_core::domain::config::ReadMode;
use studio_vfs_core::{DeleteOptions, FileInfo, VFile, VfsError, VirtualFileSystemStrict};

use super::Session;

#[derive(Subcommand)]
pub enum FileCommand {
    /// Print a file
    Read {
        path: String,

        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or replace a file
    Write {
        path: String,

        /// Content (reads stdin when neither this nor --from-file is given)
        content: Option<String>,

        /// Read content from a local file
        #[arg(long, value_name = "FILE", conflicts_with = "content")]
        from_file: Option<PathBuf>,

        #[arg(long)]
        content_type: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a file
    Rm {
        path: String,

        /// Also delete everything under `path/`
        #[arg(short, long)]
        recursive: bool,
    },

    /// List files in the scope
    Ls {
        #[arg(long)]
        json: bool,
    },

    /// Move a file
    Mv { from: String, to: String },

    /// Copy a file
    Cp { from: String, to: String },
}

pub async fn handle_command(command: FileCommand, config_path: Option<PathBuf>, scope: &str) -> Result<()> {
    let session = Session::open(config_path, scope).await?;
    let read_mode = session.config.spec.facade.read_mode;
    let builder = backend_factory::vfs_builder(&session.config, session.backend, session.scope);

    match (command, read_mode) {
        (FileCommand::Read { path, json }, ReadMode::Lenient) => {
            let view = builder.build_lenient().read_file(&path).await.map_err(describe)?;
            print_record(&view, &view.content, json)
        }
        (command, _) => run(builder.build_strict(), command).await,
    }
}

async fn run(vfs: VirtualFileSystemStrict, command: FileCommand) -> Result<()> {
    match command {
        FileCommand::Read { path, json } => {
            let file = vfs.read_file(&path).await.map_err(describe)?;
            print_record(&file, &file.content, json)
        }
        FileCommand::Write {
            path,
            content,
            from_file,
            content_type,
            description,
        } => {
            let content = match (content, from_file) {
                (Some(content), _) => content,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {:?}", file))?,
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read content from stdin")?;
                    buf
                }
            };

            let mut file = VFile::new(path.as_str(), content);
            file.content_type = content_type;
            file.description = description;
            let size = file.size();

            vfs.write_file(file).await.map_err(describe)?;
            println!("{}", format!("✓ Wrote {} ({} bytes)", path, size).green());
            Ok(())
        }
        FileCommand::Rm { path, recursive } => {
            vfs.delete_file(&path, DeleteOptions { recursive }).await.map_err(describe)?;
            println!("{}", format!("✓ Deleted {}", path).green());
            Ok(())
        }
        FileCommand::Ls { json } => {
            let files = vfs.list_files().await.map_err(describe)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                print_listing(&files);
            }
            Ok(())
        }
        FileCommand::Mv { from, to } => {
            vfs.move_file(&from, &to).await.map_err(describe)?;
            println!("{}", format!("✓ Moved {} → {}", from, to).green());
            Ok(())
        }
        FileCommand::Cp { from, to } => {
            vfs.copy_file(&from, &to).await.map_err(describe)?;
            println!("{}", format!("✓ Copied {} → {}", from, to).green());
            Ok(())
        }
    }
}

/// Prefix the error code so scripts can match on it
pub(crate) fn describe(err: VfsError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", err.code, err.message)
}

fn print_record<T: serde::Serialize>(record: &T, content: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn print_listing(files: &[FileInfo]) {
    if files.is_empty() {
        println!("{}", "(no files)".dimmed());
        return;
    }

    for file in files {
        println!(
            "{:>10}  {}  {}  {}",
            file.size,
            file.last_modified.format("%Y-%m-%d %H:%M:%S"),
            file.path.bold(),
            file.content_type.as_deref().unwrap_or("").dimmed()
        );
    }
}
