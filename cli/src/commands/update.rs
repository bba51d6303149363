// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Update Command
//!
//! Implements `studio-vfs update`, which applies the `vfs_files` schema
//! migrations bundled with `studio-vfs-core`.
//!
//! # Usage
//!
//! ```bash
//! # Apply all pending migrations
//! studio-vfs update
//!
//! # Preview migrations without applying
//! studio-vfs update --dry-run
//! ```
//!
//! # Environment
//!
//! Uses `STUDIO_VFS_DATABASE_URL`, or the `spec.storage.url` of a postgres
//! storage configuration.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use studio_vfs_core::domain::config::{StorageConfig, VfsConfig};
use studio_vfs_core::infrastructure::db::{Database, MIGRATOR};

#[derive(Args)]
pub struct UpdateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: UpdateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Studio VFS Update".bold().green());

    let config = VfsConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    let database_url = match &config.spec.storage {
        StorageConfig::Postgres { url, .. } => url.clone(),
        _ => anyhow::bail!(
            "Storage backend is not postgres. Set STUDIO_VFS_DATABASE_URL or configure spec.storage to run updates."
        ),
    };

    println!("Connecting to database...");
    let db = Database::with_max_connections(&database_url, 1).await?;

    let (applied_count, total_migrations) = db.migration_status().await?;
    println!(
        "Migration status: {} applied, {} total available.",
        applied_count, total_migrations
    );

    if applied_count < total_migrations {
        if cmd.dry_run {
            println!("Pending migrations found (Dry Run):");
            for migration in MIGRATOR.iter().skip(applied_count) {
                println!(" - {} {}", migration.version, migration.description);
            }
            println!("Skipping application due to --dry-run");
            return Ok(());
        }

        println!("Applying pending migrations...");
        db.migrate().await?;
        println!("{}", "✓ Database updated successfully.".green());
    } else {
        println!("{}", "✓ Database is up to date.".green());
    }

    Ok(())
}
