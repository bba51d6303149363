// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Media commands
//!
//! Commands: put, get, rm, reconcile, quadrants

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use studio_vfs_core::application::backend_factory;
use studio_vfs_core::application::{MediaFileStorage, QuadrantSplitter};
use studio_vfs_core::domain::media::{AudioInfo, ImageInfo, MediaKind, VideoInfo};
use studio_vfs_core::Metadata;

use super::file::describe;
use super::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Image,
    Audio,
    Video,
    Other,
}

#[derive(Subcommand)]
pub enum MediaCommand {
    /// Upload a local file as a media record
    Put {
        /// VFS path of the record
        path: String,

        /// Local file to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// MIME type (default: sniffed from content)
        #[arg(long)]
        content_type: Option<String>,

        /// Media kind (default: derived from MIME type)
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Pixel width (images default to the decoded size)
        #[arg(long)]
        width: Option<u32>,

        /// Pixel height (images default to the decoded size)
        #[arg(long)]
        height: Option<u32>,

        /// Duration in seconds for audio/video
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Download a media record's payload
    Get {
        path: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete a media record and its payload
    Rm { path: String },

    /// Remove orphaned payloads and report dangling records
    Reconcile {
        #[arg(long)]
        json: bool,
    },

    /// Split an image at URL into four quadrant records
    Quadrants {
        url: String,

        /// Parent path; quadrants are stored as <parent>/0.png .. 3.png
        parent: String,
    },
}

pub async fn handle_command(command: MediaCommand, config_path: Option<PathBuf>, scope: &str) -> Result<()> {
    let session = Session::open(config_path, scope).await?;
    let blob_store = backend_factory::create_blob_store(&session.config.spec.blob)
        .context("Failed to initialise blob store")?;
    let media = Arc::new(backend_factory::media_storage(
        &session.config,
        blob_store,
        session.backend.clone(),
        session.scope.clone(),
    ));

    match command {
        MediaCommand::Put {
            path,
            file,
            content_type,
            kind,
            width,
            height,
            duration,
        } => {
            let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let content_type = content_type
                .or_else(|| sniff_content_type(&bytes))
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let kind = kind.map(MediaKind::from).unwrap_or_else(|| kind_for(&content_type));

            put(&media, &path, Bytes::from(bytes), &content_type, kind, width, height, duration).await?;
            println!(
                "{}",
                format!("✓ Stored {} as {} ({})", file.display(), path, content_type).green()
            );
            Ok(())
        }
        MediaCommand::Get { path, output } => {
            let payload = media.read_media(&path).await.map_err(describe)?;
            write_output(&output, &payload.bytes)?;
            println!(
                "{}",
                format!("✓ Wrote {} bytes to {}", payload.bytes.len(), output.display()).green()
            );
            Ok(())
        }
        MediaCommand::Rm { path } => {
            media.delete_media(&path).await.map_err(describe)?;
            println!("{}", format!("✓ Deleted {}", path).green());
            Ok(())
        }
        MediaCommand::Reconcile { json } => {
            let report = media.reconcile().await.map_err(describe)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            if report.is_clean() {
                println!("{}", "✓ Media records and payloads are consistent".green());
            }
            for key in &report.orphaned_blobs_removed {
                println!("  {} {}", "removed orphan".yellow(), key);
            }
            for path in &report.dangling_records {
                println!("  {} {}", "dangling record".red(), path);
            }
            Ok(())
        }
        MediaCommand::Quadrants { url, parent } => {
            let splitter = QuadrantSplitter::from_config(media, &session.config.spec.media)
                .context("Failed to build HTTP client")?;
            let files = splitter.split_from_url(&url, &parent).await.map_err(describe)?;
            for file in &files {
                println!("{} {}", "✓".green(), file.path);
            }
            Ok(())
        }
    }
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => MediaKind::Image,
            KindArg::Audio => MediaKind::Audio,
            KindArg::Video => MediaKind::Video,
            KindArg::Other => MediaKind::Other,
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn put(
    media: &MediaFileStorage,
    path: &str,
    bytes: Bytes,
    content_type: &str,
    kind: MediaKind,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<f64>,
) -> Result<()> {
    match kind {
        MediaKind::Image => {
            let (width, height) = match (width, height) {
                (Some(w), Some(h)) => (w, h),
                _ => image_dimensions(&bytes)?,
            };
            media
                .save_image(path, bytes, content_type, ImageInfo { width, height })
                .await
                .map_err(describe)?;
        }
        MediaKind::Audio => {
            let duration_secs = duration.context("--duration is required for audio")?;
            media
                .save_audio(path, bytes, content_type, AudioInfo { duration_secs })
                .await
                .map_err(describe)?;
        }
        MediaKind::Video => {
            let info = VideoInfo {
                width: width.context("--width is required for video")?,
                height: height.context("--height is required for video")?,
                duration_secs: duration.context("--duration is required for video")?,
            };
            media
                .save_video(path, bytes, content_type, info)
                .await
                .map_err(describe)?;
        }
        MediaKind::Other => {
            media
                .save_media(path, bytes, content_type, MediaKind::Other, Metadata::new())
                .await
                .map_err(describe)?;
        }
    }
    Ok(())
}

fn write_output(output: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(output, bytes).with_context(|| format!("Failed to write {:?}", output))
}

/// MIME type from magic bytes
pub fn sniff_content_type(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|t| t.mime_type().to_string())
}

/// Media kind implied by a MIME type
pub fn kind_for(content_type: &str) -> MediaKind {
    match content_type.split('/').next() {
        Some("image") => MediaKind::Image,
        Some("audio") => MediaKind::Audio,
        Some("video") => MediaKind::Video,
        _ => MediaKind::Other,
    }
}

fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to inspect image")?
        .into_dimensions()
        .context("Failed to read image dimensions; pass --width and --height")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for() {
        assert_eq!(kind_for("image/png"), MediaKind::Image);
        assert_eq!(kind_for("audio/mpeg"), MediaKind::Audio);
        assert_eq!(kind_for("video/mp4"), MediaKind::Video);
        assert_eq!(kind_for("application/pdf"), MediaKind::Other);
    }

    #[test]
    fn test_sniff_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_content_type(&header).as_deref(), Some("image/png"));
        assert_eq!(sniff_content_type(b"plain words"), None);
    }

    #[test]
    fn test_image_dimensions_of_generated_png() {
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::new_rgba8(7, 3)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        assert_eq!(image_dimensions(out.get_ref()).unwrap(), (7, 3));
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_output(&path, b"payload").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }
}
