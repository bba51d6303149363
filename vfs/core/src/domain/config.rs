// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// VFS Configuration Types
//
// Kubernetes-style manifest selecting:
// - the storage backend holding file records (memory, postgres, document API)
// - the blob store holding media payloads (memory, s3)
// - path limits, façade read mode and move/copy emulation
// - media upload concurrency

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::path_validator::MAX_PATH_LENGTH;

pub const API_VERSION: &str = "studio-vfs/v1";
pub const KIND: &str = "VfsConfig";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VfsConfig {
    /// API version (must be "studio-vfs/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "VfsConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: VfsConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VfsConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub blob: BlobConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub facade: FacadeConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

/// Where file records live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Volatile, process-wide store (development/testing)
    Memory,

    /// `vfs_files` table in PostgreSQL
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },

    /// Remote transactional document API
    Document {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory
    }
}

/// Where media payloads live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BlobConfig {
    Memory,

    S3 {
        bucket: String,
        region: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_access_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<String>,
    },
}

impl Default for BlobConfig {
    fn default() -> Self {
        BlobConfig::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_max_path_length")]
    pub max_length: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_path_length(),
        }
    }
}

/// How the façade reports a missing file on read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// `FILE_NOT_FOUND` error
    Strict,
    /// Synthetic "Error: File not found" text file
    #[default]
    Lenient,
}

/// What the façade does when a backend has no native move/copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Fall back to read, write, then delete (not atomic)
    #[default]
    Emulate,
    /// Surface `OPERATION_NOT_SUPPORTED`
    NativeOnly,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FacadeConfig {
    #[serde(default)]
    pub read_mode: ReadMode,

    #[serde(default)]
    pub transfer: TransferMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Simultaneous quadrant uploads
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Timeout for fetching source images
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: default_upload_concurrency(),
            fetch_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "studio-vfs".to_string(),
                labels: None,
            },
            spec: VfsConfigSpec::default(),
        }
    }
}

impl VfsConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate locations, in precedence order
    /// 1. STUDIO_VFS_CONFIG_PATH environment variable
    /// 2. ./studio-vfs.yaml (working directory)
    /// 3. ~/.studio-vfs/config.yaml (user home)
    /// 4. /etc/studio-vfs/config.yaml (system)
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("STUDIO_VFS_CONFIG_PATH") {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./studio-vfs.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".studio-vfs").join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/studio-vfs/config.yaml"));
        paths
    }

    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STUDIO_VFS_DATABASE_URL") {
            tracing::info!("Environment override: STUDIO_VFS_DATABASE_URL");
            let max_connections = match &self.spec.storage {
                StorageConfig::Postgres { max_connections, .. } => *max_connections,
                _ => default_max_connections(),
            };
            self.spec.storage = StorageConfig::Postgres { url, max_connections };
        }

        if let Some(url) = lookup("STUDIO_VFS_DOCUMENT_URL") {
            tracing::info!("Environment override: STUDIO_VFS_DOCUMENT_URL");
            self.spec.storage = StorageConfig::Document {
                url,
                token: lookup("STUDIO_VFS_DOCUMENT_TOKEN"),
                timeout_secs: default_timeout_secs(),
            };
        }

        if let Some(val) = lookup("STUDIO_VFS_READ_MODE") {
            match val.to_lowercase().as_str() {
                "strict" => self.spec.facade.read_mode = ReadMode::Strict,
                "lenient" => self.spec.facade.read_mode = ReadMode::Lenient,
                _ => {
                    tracing::warn!(
                        "Invalid value for STUDIO_VFS_READ_MODE: '{}'. Expected strict/lenient. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        match &self.spec.storage {
            StorageConfig::Memory => {}
            StorageConfig::Postgres { url, max_connections } => {
                if url.is_empty() {
                    anyhow::bail!("spec.storage.url cannot be empty for postgres backend");
                }
                if *max_connections == 0 {
                    anyhow::bail!("spec.storage.max_connections must be at least 1");
                }
            }
            StorageConfig::Document { url, .. } => {
                if url.is_empty() {
                    anyhow::bail!("spec.storage.url cannot be empty for document backend");
                }
            }
        }

        if let BlobConfig::S3 { bucket, region, .. } = &self.spec.blob {
            if bucket.is_empty() {
                anyhow::bail!("spec.blob.bucket cannot be empty");
            }
            if region.is_empty() {
                anyhow::bail!("spec.blob.region cannot be empty");
            }
        }

        if self.spec.paths.max_length == 0 {
            anyhow::bail!("spec.paths.max_length must be greater than zero");
        }

        if self.spec.media.upload_concurrency == 0 {
            anyhow::bail!("spec.media.upload_concurrency must be greater than zero");
        }

        Ok(())
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_path_length() -> usize {
    MAX_PATH_LENGTH
}

fn default_upload_concurrency() -> usize {
    4
}
