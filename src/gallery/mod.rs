//! Gallery domain: listing, caching, pagination and thumbnails.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       GalleryService                         │
//! │                                                              │
//! │  ┌────────────────┐  ┌────────────┐  ┌────────────────────┐  │
//! │  │ ImageListCache │  │  paginate  │  │ ThumbnailRenderer  │  │
//! │  │ (RwLock)       │  │            │  │ + ThumbnailCache   │  │
//! │  └───────┬────────┘  └────────────┘  └─────────┬──────────┘  │
//! │          │                                     │             │
//! │  ┌───────▼────────┐                   ┌────────▼──────────┐  │
//! │  │ListingResolver │                   │   ObjectFetcher   │  │
//! │  │ sdk → manifest │                   │   (reqwest)       │  │
//! │  │ → file → env   │                   └───────────────────┘  │
//! │  │ → placeholder  │                                          │
//! │  └────────────────┘                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod cache;
mod listing;
mod pagination;
mod service;
mod thumbnail;
mod thumbnail_cache;

pub use cache::{ImageList, ImageListCache};
pub use listing::{
    is_image_key, is_valid_image_key, normalize_listing, FileListing, ListingResolver,
    ListingStrategy, ManifestListing, PlaceholderListing, SdkListing, StaticListing,
    DEFAULT_MAX_KEYS, DEFAULT_PLACEHOLDER_COUNT, IMAGE_EXTENSIONS,
};
pub use pagination::{paginate, parse_page, Page, Pagination, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use service::{
    content_type_for_key, GalleryImage, GalleryPage, GalleryService, ImageData, ImageInfo,
};
pub use thumbnail::{
    clamp_quality, Thumbnail, ThumbnailEncoder, ThumbnailRenderer, DEFAULT_THUMBNAIL_QUALITY,
    DEFAULT_THUMBNAIL_SIZE, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use thumbnail_cache::{ThumbnailCache, ThumbnailKey, DEFAULT_THUMBNAIL_CACHE_CAPACITY};
