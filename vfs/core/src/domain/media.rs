// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Media descriptors attached to blob-backed file records.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::blob::BlobReceipt;
use crate::domain::file::{Metadata, VFile, DECLARED_SIZE_KEY};

pub const BLOB_KEY: &str = "blob_key";
pub const BLOB_RECEIPT_KEY: &str = "blob_receipt";
pub const MEDIA_KIND_KEY: &str = "media_kind";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

impl ImageInfo {
    pub fn into_metadata(self) -> Metadata {
        let mut m = Metadata::new();
        m.insert("width".to_string(), json!(self.width));
        m.insert("height".to_string(), json!(self.height));
        m
    }
}

impl AudioInfo {
    pub fn into_metadata(self) -> Metadata {
        let mut m = Metadata::new();
        m.insert("duration_secs".to_string(), json!(self.duration_secs));
        m
    }
}

impl VideoInfo {
    pub fn into_metadata(self) -> Metadata {
        let mut m = Metadata::new();
        m.insert("width".to_string(), json!(self.width));
        m.insert("height".to_string(), json!(self.height));
        m.insert("duration_secs".to_string(), json!(self.duration_secs));
        m
    }
}

/// Build the metadata bag for a blob-backed record.
///
/// `extra` fields are applied first so the blob bookkeeping keys cannot be
/// overridden by callers.
pub fn media_metadata(kind: MediaKind, receipt: &BlobReceipt, extra: Metadata) -> Metadata {
    let mut metadata = extra;
    metadata.insert(MEDIA_KIND_KEY.to_string(), json!(kind.as_str()));
    metadata.insert(BLOB_KEY.to_string(), json!(receipt.key));
    metadata.insert(DECLARED_SIZE_KEY.to_string(), json!(receipt.size));
    metadata.insert(
        BLOB_RECEIPT_KEY.to_string(),
        serde_json::to_value(receipt).unwrap_or(serde_json::Value::Null),
    );
    metadata
}

/// Blob key recorded on a file, if it is blob-backed
pub fn blob_key_of(file: &VFile) -> Option<&str> {
    file.metadata
        .as_ref()
        .and_then(|m| m.get(BLOB_KEY))
        .and_then(serde_json::Value::as_str)
}

/// A media record together with its downloaded bytes
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub file: VFile,
    pub bytes: Bytes,
}
