//! # Bucket Gallery
//!
//! A password-gated web gallery for images stored in OCI Object Storage.
//!
//! The gallery lists the images in a bucket, pages through them and renders
//! JPEG thumbnails on the fly. Listing degrades gracefully: when the
//! authenticated SDK listing is unavailable it falls back to a manifest read
//! through a pre-authenticated request (PAR) URL, then to local lists, and
//! finally to placeholder names.
//!
//! ## Features
//!
//! - **Listing fallback chain**: S3-compatible SDK, PAR manifest, local file, environment, placeholders
//! - **Thumbnails**: Downsized JPEGs embedded as data URIs, cached in a byte-bounded LRU
//! - **Image proxy**: Full-size images streamed through the server
//! - **Authentication**: Shared password with HMAC-signed session cookies
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`storage`] - Object fetching, URL composition and the S3 client
//! - [`gallery`] - Listing strategies, caches, pagination and thumbnails
//! - [`server`] - Axum-based HTTP server, session auth and pages
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use bucket_gallery::{
//!     create_router, GalleryService, HttpFetcher, ListingResolver, PlaceholderListing,
//!     RouterConfig, SessionAuth, UrlResolver,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let fetcher = Arc::new(HttpFetcher::new());
//!     let urls = UrlResolver::for_bucket("us-ashburn-1", "my-namespace", "photos");
//!     let listing = ListingResolver::new().with_strategy(PlaceholderListing::default());
//!
//!     let gallery = GalleryService::new(fetcher, urls, listing);
//!     let auth = SessionAuth::new("secret", Duration::from_secs(86400))
//!         .with_password(Some("viewer-password"));
//!
//!     let router = create_router(gallery, RouterConfig::new(auth));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod gallery;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use config::{Cli, Command, ListConfig, ServeConfig, StorageConfig};
pub use error::{StorageError, ThumbnailError};
pub use gallery::{
    paginate, FileListing, GalleryImage, GalleryPage, GalleryService, ImageListCache,
    ListingResolver, ListingStrategy, ManifestListing, Pagination, PlaceholderListing, SdkListing,
    StaticListing, Thumbnail, ThumbnailCache, ThumbnailEncoder, ThumbnailRenderer,
};
pub use server::{
    create_router, health_handler, session_middleware, AppState, AuthError, ErrorResponse,
    RouterConfig, SessionAuth, SESSION_COOKIE_NAME,
};
pub use storage::{create_s3_client, HttpFetcher, ObjectFetcher, ObjectInfo, UrlResolver};
