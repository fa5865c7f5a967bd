//! Thumbnail rendering.
//!
//! # Pipeline
//!
//! ```text
//! image key ─▶ UrlResolver ─▶ ObjectFetcher::fetch ─▶ decode ─▶ downsize ─▶ JPEG ─▶ data URI
//! ```
//!
//! - **Format detection**: the source format is guessed from the bytes, not the
//!   key, so mislabelled objects still decode.
//! - **Downsize only**: images already within the bounds keep their size.
//! - **Aspect ratio**: preserved; the result fits inside `max_w × max_h`.
//! - **Failures**: logged and turned into `None`; a gallery page never fails
//!   because one image is broken.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tracing::{debug, warn};

use crate::error::ThumbnailError;
use crate::storage::{ObjectFetcher, UrlResolver, DEFAULT_FETCH_TIMEOUT};

use super::thumbnail_cache::{ThumbnailCache, ThumbnailKey};

/// Default bounding box edge for thumbnails.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 300;

/// Default JPEG quality for thumbnails.
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 85;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// A rendered thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// JPEG bytes
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:` URI suitable for an `<img src>` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.data))
    }
}

// =============================================================================
// Encoder
// =============================================================================

/// Decodes source images and re-encodes them as size-capped JPEG thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailEncoder {
    quality: u8,
}

impl ThumbnailEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Decode `source`, fit it within `max_width × max_height` and encode as JPEG.
    pub fn encode(
        &self,
        source: &[u8],
        max_width: u32,
        max_height: u32,
    ) -> Result<Thumbnail, ThumbnailError> {
        let img = decode(source)?;
        let img = fit_within(img, max_width.max(1), max_height.max(1));

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| ThumbnailError::Encode {
                message: e.to_string(),
            })?;

        Ok(Thumbnail {
            data: Bytes::from(output),
            width,
            height,
        })
    }
}

impl Default for ThumbnailEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_QUALITY)
    }
}

fn decode(source: &[u8]) -> Result<DynamicImage, ThumbnailError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| ThumbnailError::Decode {
            message: e.to_string(),
        })?;

    reader.decode().map_err(|e| ThumbnailError::Decode {
        message: e.to_string(),
    })
}

/// Downsize (never upscale) so the image fits the bounding box, keeping aspect ratio.
fn fit_within(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if img.width() <= max_width && img.height() <= max_height {
        return img;
    }
    img.resize(max_width, max_height, FilterType::Lanczos3)
}

/// Clamp quality to the valid JPEG range (1-100).
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Renderer
// =============================================================================

/// Fetches images by key and renders cached thumbnails for them.
pub struct ThumbnailRenderer<F: ObjectFetcher> {
    fetcher: Arc<F>,
    urls: UrlResolver,
    encoder: ThumbnailEncoder,
    cache: ThumbnailCache,
}

impl<F: ObjectFetcher> ThumbnailRenderer<F> {
    pub fn new(fetcher: Arc<F>, urls: UrlResolver, encoder: ThumbnailEncoder) -> Self {
        Self::with_cache(fetcher, urls, encoder, ThumbnailCache::new())
    }

    pub fn with_cache(
        fetcher: Arc<F>,
        urls: UrlResolver,
        encoder: ThumbnailEncoder,
        cache: ThumbnailCache,
    ) -> Self {
        Self {
            fetcher,
            urls,
            encoder,
            cache,
        }
    }

    /// Render a thumbnail for `key`, or `None` if it cannot be fetched or decoded.
    pub async fn render(&self, key: &str, max_width: u32, max_height: u32) -> Option<Thumbnail> {
        let cache_key = ThumbnailKey::new(key, max_width, max_height, self.encoder.quality());
        if let Some(thumbnail) = self.cache.get(&cache_key).await {
            debug!(key, "Thumbnail cache hit");
            return Some(thumbnail);
        }

        match self.try_render(key, max_width, max_height).await {
            Ok(thumbnail) => {
                self.cache.put(cache_key, thumbnail.clone()).await;
                Some(thumbnail)
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to render thumbnail");
                None
            }
        }
    }

    async fn try_render(
        &self,
        key: &str,
        max_width: u32,
        max_height: u32,
    ) -> Result<Thumbnail, ThumbnailError> {
        let url = self.urls.image_url(key);
        let source = self.fetcher.fetch(&url, DEFAULT_FETCH_TIMEOUT).await?;

        let encoder = self.encoder.clone();
        // Decoding a multi-megapixel photo is CPU-bound
        tokio::task::spawn_blocking(move || encoder.encode(&source, max_width, max_height))
            .await
            .map_err(|e| ThumbnailError::Encode {
                message: e.to_string(),
            })?
    }

    /// Forget every rendered thumbnail.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }
}
