// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Studio VFS CLI
//!
//! The `studio-vfs` binary operates on one scope of the virtual file system
//! using the backends selected by the configuration manifest.
//!
//! ## Commands
//!
//! - `studio-vfs file read|write|rm|ls|mv|cp` - Text file operations
//! - `studio-vfs media put|get|rm|reconcile|quadrants` - Blob-backed media
//! - `studio-vfs config show|validate|generate` - Configuration management
//! - `studio-vfs update [--dry-run]` - Apply database migrations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use studio_vfs_cli::commands::{self, ConfigCommand, FileCommand, MediaCommand, UpdateCommand};

/// Studio VFS - scoped virtual file system for agent tools
#[derive(Parser)]
#[command(name = "studio-vfs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "STUDIO_VFS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "STUDIO_VFS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Thread or project scope to operate on
    #[arg(long, global = true, env = "STUDIO_VFS_SCOPE", default_value = "default")]
    scope: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Text file operations
    #[command(name = "file")]
    File {
        #[command(subcommand)]
        command: FileCommand,
    },

    /// Media file operations
    #[command(name = "media")]
    Media {
        #[command(subcommand)]
        command: MediaCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Update the VFS database schema
    #[command(name = "update")]
    Update {
        #[command(flatten)]
        command: UpdateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::File { command }) => commands::file::handle_command(command, cli.config, &cli.scope).await,
        Some(Commands::Media { command }) => commands::media::handle_command(command, cli.config, &cli.scope).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        Some(Commands::Update { command }) => commands::update::execute(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
