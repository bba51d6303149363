// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Quadrant Splitting
//!
//! Fetches a source image, cuts it into four quadrants and stores each one as
//! an independent media file under the parent path:
//!
//! | index | quadrant     |
//! |-------|--------------|
//! | 0     | top-left     |
//! | 1     | top-right    |
//! | 2     | bottom-left  |
//! | 3     | bottom-right |
//!
//! With odd dimensions the extra column/row goes to the right/bottom
//! quadrants. Uploads run with bounded concurrency (4 by default).

use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use image::{DynamicImage, GenericImageView, ImageFormat};
use reqwest::Client;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::application::media_storage::MediaFileStorage;
use crate::domain::config::MediaConfig;
use crate::domain::error::VfsError;
use crate::domain::file::VFile;
use crate::domain::media::{ImageInfo, MediaKind};

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum QuadrantError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode quadrant {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("Image of {width}x{height} is too small to split")]
    TooSmall { width: u32, height: u32 },

    #[error("Image processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One encoded quadrant ready for upload
#[derive(Debug, Clone)]
pub struct Quadrant {
    pub index: usize,
    pub png: Bytes,
    pub width: u32,
    pub height: u32,
}

pub struct QuadrantSplitter {
    client: Client,
    media: Arc<MediaFileStorage>,
    concurrency: usize,
}

impl QuadrantSplitter {
    pub fn new(client: Client, media: Arc<MediaFileStorage>) -> Self {
        Self {
            client,
            media,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }

    pub fn from_config(media: Arc<MediaFileStorage>, config: &MediaConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Ok(Self::new(client, media).with_concurrency(config.upload_concurrency))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch `url`, split it and store `<parent>/0.png` .. `<parent>/3.png`.
    ///
    /// Returned records are ordered by quadrant index. A failed upload fails
    /// the whole call; quadrants already stored are left in place.
    /// Every target path is validated before the source is fetched.
    pub async fn split_from_url(&self, url: &str, parent_path: &str) -> Result<Vec<VFile>, VfsError> {
        let validator = self.media.validator();
        validator.validate(parent_path)?;
        for index in 0..4 {
            validator.validate(&quadrant_path(parent_path, index))?;
        }

        let source = self
            .fetch(url)
            .await
            .map_err(|e| VfsError::operation_failed(parent_path, e))?;

        let quadrants = tokio::task::spawn_blocking(move || split_png_quadrants(&source))
            .await
            .map_err(QuadrantError::from)
            .and_then(|result| result)
            .map_err(|e| VfsError::operation_failed(parent_path, e))?;

        tracing::debug!(url = %url, parent = %parent_path, "Split source image into quadrants");

        let uploads = quadrants.into_iter().map(|quadrant| {
            let media = Arc::clone(&self.media);
            let path = quadrant_path(parent_path, quadrant.index);
            let mut extra = ImageInfo {
                width: quadrant.width,
                height: quadrant.height,
            }
            .into_metadata();
            extra.insert("quadrant".to_string(), json!(quadrant.index));
            extra.insert("source_url".to_string(), json!(url));

            async move {
                media
                    .save_media(&path, quadrant.png, "image/png", MediaKind::Image, extra)
                    .await
                    .map(|file| (quadrant.index, file))
            }
        });

        let mut stored: Vec<(usize, VFile)> = stream::iter(uploads)
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;
        stored.sort_by_key(|(index, _)| *index);

        tracing::info!(url = %url, parent = %parent_path, count = stored.len(), "Stored image quadrants");
        Ok(stored.into_iter().map(|(_, file)| file).collect())
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, QuadrantError> {
        let response = self.client.get(url).send().await.map_err(|e| QuadrantError::Fetch {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuadrantError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| QuadrantError::Fetch {
            url: url.to_string(),
            source: e,
        })
    }
}

/// `<parent>/<index>.png`, ignoring trailing slashes on the parent
pub fn quadrant_path(parent_path: &str, index: usize) -> String {
    format!("{}/{}.png", parent_path.trim_end_matches('/'), index)
}

/// Crop rectangles `(x, y, width, height)` in quadrant index order
pub fn quadrant_bounds(width: u32, height: u32) -> [(u32, u32, u32, u32); 4] {
    let left = width / 2;
    let right = width - left;
    let top = height / 2;
    let bottom = height - top;
    [
        (0, 0, left, top),
        (left, 0, right, top),
        (0, top, left, bottom),
        (left, top, right, bottom),
    ]
}

/// Decode `source` and encode its four quadrants as PNG
pub fn split_png_quadrants(source: &[u8]) -> Result<Vec<Quadrant>, QuadrantError> {
    let image = image::load_from_memory(source).map_err(QuadrantError::Decode)?;
    split_image(&image)
}

fn split_image(image: &DynamicImage) -> Result<Vec<Quadrant>, QuadrantError> {
    let (width, height) = image.dimensions();
    if width < 2 || height < 2 {
        return Err(QuadrantError::TooSmall { width, height });
    }

    quadrant_bounds(width, height)
        .into_iter()
        .enumerate()
        .map(|(index, (x, y, w, h))| {
            let mut png = Cursor::new(Vec::new());
            image
                .crop_imm(x, y, w, h)
                .write_to(&mut png, ImageFormat::Png)
                .map_err(|source| QuadrantError::Encode { index, source })?;
            Ok(Quadrant {
                index,
                png: Bytes::from(png.into_inner()),
                width: w,
                height: h,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_quadrant_paths() {
        assert_eq!(quadrant_path("/renders/shot", 0), "/renders/shot/0.png");
        assert_eq!(quadrant_path("/renders/shot/", 3), "/renders/shot/3.png");
        assert_eq!(quadrant_path("/", 1), "/1.png");
    }

    #[test]
    fn test_odd_dimensions_favor_right_and_bottom() {
        let bounds = quadrant_bounds(5, 3);
        assert_eq!(bounds[0], (0, 0, 2, 1));
        assert_eq!(bounds[1], (2, 0, 3, 1));
        assert_eq!(bounds[2], (0, 1, 2, 2));
        assert_eq!(bounds[3], (2, 1, 3, 2));
    }

    #[test]
    fn test_split_keeps_pixels_in_place() {
        // Each quadrant painted a distinct colour
        let colours = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
            Rgba([255, 255, 0, 255]),
        ];
        let img = RgbaImage::from_fn(4, 4, |x, y| {
            let index = (if y < 2 { 0 } else { 2 }) + (if x < 2 { 0 } else { 1 });
            colours[index]
        });

        let quadrants = split_image(&DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(quadrants.len(), 4);

        for quadrant in &quadrants {
            let decoded = image::load_from_memory(&quadrant.png).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (2, 2));
            assert!(decoded.pixels().all(|p| *p == colours[quadrant.index]));
        }
    }

    #[test]
    fn test_too_small() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(1, 8));
        assert!(matches!(
            split_image(&img),
            Err(QuadrantError::TooSmall { width: 1, height: 8 })
        ));
    }

    #[test]
    fn test_garbage_does_not_decode() {
        assert!(matches!(
            split_png_quadrants(b"definitely not an image"),
            Err(QuadrantError::Decode(_))
        ));
    }
}
