//! Gallery service orchestrating listing, pagination and thumbnails.
//!
//! `GalleryService` is the single owner of the image list cache and the
//! thumbnail cache. Handlers hold it behind an `Arc` and call into it; nothing
//! here knows about HTTP.
//!
//! # Request Flow
//!
//! ```text
//! page(n) ─▶ ImageListCache::get ─▶ paginate ─▶ for each key: UrlResolver + ThumbnailRenderer
//! ```
//!
//! Thumbnails for a page are rendered one after another; a page of 20 images
//! issues at most 20 object fetches, fewer when thumbnails are cached.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage::{ObjectFetcher, UrlResolver, DEFAULT_FETCH_TIMEOUT, IMAGE_PROXY_TIMEOUT};

use super::cache::{ImageList, ImageListCache};
use super::listing::{is_valid_image_key, ListingResolver};
use super::pagination::{paginate, Pagination, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use super::thumbnail::{ThumbnailEncoder, ThumbnailRenderer, DEFAULT_THUMBNAIL_SIZE};
use super::thumbnail_cache::ThumbnailCache;

/// One image as shown in the gallery page and the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    pub name: String,
    pub url: String,
    /// `data:image/jpeg;base64,...`, or `null` when rendering failed
    pub thumbnail: Option<String>,
}

/// A rendered page of the gallery.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryPage {
    pub images: Vec<GalleryImage>,
    pub pagination: Pagination,
}

/// Object metadata returned by the image-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

/// Raw image bytes proxied from object storage.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: Bytes,
    pub content_type: &'static str,
}

/// Guess a `Content-Type` from the key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// The gallery: cached listing, pages with thumbnails, image proxying.
pub struct GalleryService<F: ObjectFetcher> {
    images: ImageListCache,
    renderer: ThumbnailRenderer<F>,
    fetcher: Arc<F>,
    urls: UrlResolver,
    per_page: usize,
    thumbnail_size: u32,
}

impl<F: ObjectFetcher> GalleryService<F> {
    /// Create a service with default page size, thumbnail size and caches.
    pub fn new(fetcher: Arc<F>, urls: UrlResolver, resolver: ListingResolver) -> Self {
        let renderer =
            ThumbnailRenderer::new(Arc::clone(&fetcher), urls.clone(), ThumbnailEncoder::default());
        Self {
            images: ImageListCache::new(resolver),
            renderer,
            fetcher,
            urls,
            per_page: DEFAULT_PER_PAGE,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }

    /// Default number of images per page.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Bounding box edge for thumbnails.
    pub fn with_thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size.max(1);
        self
    }

    /// Replace the thumbnail encoder and cache.
    pub fn with_thumbnails(mut self, encoder: ThumbnailEncoder, cache: ThumbnailCache) -> Self {
        self.renderer = ThumbnailRenderer::with_cache(
            Arc::clone(&self.fetcher),
            self.urls.clone(),
            encoder,
            cache,
        );
        self
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }

    pub fn renderer(&self) -> &ThumbnailRenderer<F> {
        &self.renderer
    }

    /// The image list, resolved on first use.
    pub async fn images(&self) -> ImageList {
        self.images.get(false).await
    }

    /// Render one page of the gallery.
    ///
    /// `per_page` of `None` uses the configured default.
    pub async fn page(&self, page: usize, per_page: Option<usize>) -> GalleryPage {
        let per_page = per_page.unwrap_or(self.per_page);
        let list = self.images.get(false).await;
        let page = paginate(&list, page, per_page);

        let mut images = Vec::with_capacity(page.items.len());
        for name in page.items {
            let thumbnail = self
                .renderer
                .render(name, self.thumbnail_size, self.thumbnail_size)
                .await
                .map(|t| t.data_uri());

            images.push(GalleryImage {
                name: name.clone(),
                url: self.urls.image_url(name),
                thumbnail,
            });
        }

        debug!(
            page = page.pagination.current_page,
            images = images.len(),
            total = page.pagination.total_images,
            "Rendered gallery page"
        );

        GalleryPage {
            images,
            pagination: page.pagination,
        }
    }

    /// Re-resolve the listing and drop every cached thumbnail.
    ///
    /// Returns the new image count.
    pub async fn refresh(&self) -> usize {
        let list = self.images.get(true).await;
        self.renderer.clear_cache().await;
        info!(count = list.len(), "Image list refreshed");
        list.len()
    }

    /// URL the gallery links to for an image.
    pub fn image_url(&self, name: &str) -> String {
        self.urls.image_url(name)
    }

    /// Fetch the raw bytes of an image.
    ///
    /// Names that are not valid image keys are reported as not found without
    /// touching the network.
    pub async fn fetch_image(&self, name: &str) -> Result<ImageData, StorageError> {
        validate_name(name)?;
        let data = self
            .fetcher
            .fetch(&self.urls.image_url(name), IMAGE_PROXY_TIMEOUT)
            .await?;

        Ok(ImageData {
            data,
            content_type: content_type_for_key(name),
        })
    }

    /// HEAD an image for its size and content type.
    ///
    /// Falls back to the extension-derived type when upstream sends none.
    pub async fn image_info(&self, name: &str) -> Result<ImageInfo, StorageError> {
        validate_name(name)?;
        let url = self.urls.image_url(name);
        let info = self.fetcher.head(&url, DEFAULT_FETCH_TIMEOUT).await?;

        Ok(ImageInfo {
            name: name.to_string(),
            url,
            size: info.size,
            content_type: info
                .content_type
                .unwrap_or_else(|| content_type_for_key(name).to_string()),
        })
    }
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if is_valid_image_key(name) {
        Ok(())
    } else {
        Err(StorageError::NotFound(name.to_string()))
    }
}
