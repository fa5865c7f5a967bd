//! Test utilities for integration tests.
//!
//! This module provides a mock object fetcher, helpers for generating small
//! test images and a router builder with a known secret and password.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use bucket_gallery::error::StorageError;
use bucket_gallery::gallery::{GalleryService, ListingResolver, StaticListing};
use bucket_gallery::storage::{ObjectFetcher, ObjectInfo, UrlResolver};
use bucket_gallery::{create_router, RouterConfig, SessionAuth, SESSION_COOKIE_NAME};

pub const TEST_SECRET: &str = "test-secret-key-for-session-signing";
pub const TEST_PASSWORD: &str = "open-sesame";
pub const TEST_PAR_URL: &str = "https://objectstorage.us-ashburn-1.oraclecloud.com/p/tok/n/testns/b/testbucket/o/";
pub const TEST_BASE_URL: &str =
    "https://objectstorage.us-ashburn-1.oraclecloud.com/p/tok/n/testns/b/testbucket/o";

// =============================================================================
// Mock Object Fetcher
// =============================================================================

/// An in-memory object store keyed by URL, with request tracking.
///
/// URLs not registered answer with `StorageError::NotFound`; URLs marked as
/// failing answer with `StorageError::Connection`.
#[derive(Clone, Default)]
pub struct MockFetcher {
    objects: Arc<HashMap<String, Bytes>>,
    failing: Arc<HashSet<String>>,
    fetch_count: Arc<AtomicUsize>,
    requested: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object under its full URL.
    pub fn with_object(mut self, url: impl Into<String>, data: Vec<u8>) -> Self {
        Arc::make_mut(&mut self.objects).insert(url.into(), Bytes::from(data));
        self
    }

    /// Register an image under `{TEST_BASE_URL}/{key}`.
    pub fn with_image(self, key: &str, data: Vec<u8>) -> Self {
        self.with_object(format!("{}/{}", TEST_BASE_URL, key), data)
    }

    /// Make requests for this URL fail with a connection error.
    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.failing).insert(url.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub async fn requested_urls(&self) -> Vec<String> {
        self.requested.read().await.clone()
    }

    fn lookup(&self, url: &str) -> Result<Bytes, StorageError> {
        if self.failing.contains(url) {
            return Err(StorageError::Connection(format!("refused: {}", url)));
        }
        self.objects
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}

#[async_trait]
impl ObjectFetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Bytes, StorageError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.requested.write().await.push(url.to_string());
        self.lookup(url)
    }

    async fn head(&self, url: &str, _timeout: Duration) -> Result<ObjectInfo, StorageError> {
        self.requested.write().await.push(url.to_string());
        let data = self.lookup(url)?;
        Ok(ObjectInfo {
            size: data.len() as u64,
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

// =============================================================================
// Test Images
// =============================================================================

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .expect("Failed to encode test image");
    buf.into_inner()
}

/// Create a JPEG image of the given size.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}

/// Create a PNG image of the given size.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

/// Check if data is a valid JPEG (starts with SOI, ends with EOI).
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 4
        && data[0] == 0xFF
        && data[1] == 0xD8
        && data[data.len() - 2] == 0xFF
        && data[data.len() - 1] == 0xD9
}

// =============================================================================
// Router Helpers
// =============================================================================

pub fn test_urls() -> UrlResolver {
    UrlResolver::from_par(TEST_PAR_URL).expect("valid PAR URL")
}

pub fn test_auth() -> SessionAuth {
    SessionAuth::new(TEST_SECRET, Duration::from_secs(3600)).with_password(Some(TEST_PASSWORD))
}

/// Gallery over a fixed list of keys.
pub fn gallery_with_keys(fetcher: MockFetcher, keys: &[&str]) -> GalleryService<MockFetcher> {
    let listing = ListingResolver::new().with_strategy(StaticListing::new(
        keys.iter().map(|k| k.to_string()).collect(),
    ));
    GalleryService::new(Arc::new(fetcher), test_urls(), listing)
}

/// Router over a gallery, with the test secret and password and no tracing.
pub fn test_router(gallery: GalleryService<MockFetcher>) -> Router {
    create_router(gallery, RouterConfig::new(test_auth()).with_tracing(false))
}

/// `Cookie` header value for a signed-in viewer.
pub fn session_cookie() -> String {
    format!("{}={}", SESSION_COOKIE_NAME, test_auth().issue())
}

/// GET request carrying a valid session cookie.
pub fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, session_cookie())
        .body(Body::empty())
        .unwrap()
}

/// GET request without a session.
pub fn anonymous_get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Numbered image keys: `img_001.jpg`, `img_002.jpg`, ...
pub fn numbered_keys(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("img_{:03}.jpg", i)).collect()
}
