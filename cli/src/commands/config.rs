// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use studio_vfs_core::domain::config::{BlobConfig, StorageConfig, VfsConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./studio-vfs.yaml)
        #[arg(short, long, default_value = "./studio-vfs.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = VfsConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  0. --config flag: {}", path.display());
        } else {
            println!("  0. --config flag: {}", "(not set)".dimmed());
        }
        for (i, path) in VfsConfig::search_paths().iter().enumerate() {
            let marker = if path.exists() { "✓".green() } else { "-".dimmed() };
            println!("  {}. {} {}", i + 1, path.display(), marker);
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Storage:".bold());
    match &config.spec.storage {
        StorageConfig::Memory => println!("  Backend: memory"),
        StorageConfig::Postgres { url, max_connections } => {
            println!("  Backend: postgres");
            println!("  URL: {}", redact_url(url));
            println!("  Max connections: {}", max_connections);
        }
        StorageConfig::Document {
            url,
            token,
            timeout_secs,
        } => {
            println!("  Backend: document");
            println!("  URL: {}", url);
            println!("  Token: {}", if token.is_some() { "(set)" } else { "(not set)" });
            println!("  Timeout: {}s", timeout_secs);
        }
    }
    println!();

    println!("{}", "Blob store:".bold());
    match &config.spec.blob {
        BlobConfig::Memory => println!("  Backend: memory"),
        BlobConfig::S3 {
            bucket,
            region,
            endpoint,
            ..
        } => {
            println!("  Backend: s3");
            println!("  Bucket: {} ({})", bucket, region);
            if let Some(endpoint) = endpoint {
                println!("  Endpoint: {}", endpoint);
            }
        }
    }
    println!();

    println!("{}", "Façade:".bold());
    println!("  Read mode: {:?}", config.spec.facade.read_mode);
    println!("  Transfer: {:?}", config.spec.facade.transfer);
    println!("  Max path length: {}", config.spec.paths.max_length);
    println!("  Upload concurrency: {}", config.spec.media.upload_concurrency);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = VfsConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample).with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());

    Ok(())
}

/// Hide the password in a connection URL
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}
