//! Image listing resolution.
//!
//! The bucket can be enumerated in several ways depending on what the
//! deployment has access to. Each way is a [`ListingStrategy`]; the
//! [`ListingResolver`] tries them in order and takes the first success:
//!
//! ```text
//! SdkListing ──err──▶ ManifestListing ──err──▶ FileListing ──err──▶ StaticListing ──err──▶ PlaceholderListing
//! ```
//!
//! Failures are logged and never reach the caller. Whatever list wins is
//! filtered to image keys, sorted and de-duplicated.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::storage::{ObjectFetcher, DEFAULT_FETCH_TIMEOUT};

/// Extensions (lowercase, with dot) that mark an object as an image.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".tif",
];

/// Number of synthetic keys produced by [`PlaceholderListing`].
pub const DEFAULT_PLACEHOLDER_COUNT: usize = 500;

/// Upper bound on image keys collected by [`SdkListing`].
pub const DEFAULT_MAX_KEYS: usize = 10_000;

/// Page size for `ListObjectsV2` calls.
const LIST_PAGE_SIZE: i32 = 1000;

/// Check if a key has a recognized image extension (case-insensitive).
pub fn is_image_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| key_lower.ends_with(ext))
}

/// Check that a key is safe to compose into an object URL.
///
/// Rejects empty keys, keys with `..` segments and non-image keys.
pub fn is_valid_image_key(key: &str) -> bool {
    !key.is_empty() && !key.split('/').any(|segment| segment == "..") && is_image_key(key)
}

/// Keep image keys only, then sort and de-duplicate.
pub fn normalize_listing(keys: Vec<String>) -> Vec<String> {
    let mut images: Vec<String> = keys
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| is_valid_image_key(k))
        .collect();
    images.sort();
    images.dedup();
    images
}

// =============================================================================
// ListingStrategy Trait
// =============================================================================

/// One way of enumerating the image keys in the bucket.
#[async_trait]
pub trait ListingStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Produce the raw key list. Unusable data must be reported as an error so
    /// the resolver moves on to the next strategy.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

// =============================================================================
// Strategies
// =============================================================================

/// Authenticated listing through the S3-compatible SDK.
pub struct SdkListing {
    client: Client,
    bucket: String,
    max_keys: usize,
}

impl SdkListing {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            max_keys: DEFAULT_MAX_KEYS,
        }
    }

    /// Stop paging once this many image keys have been collected.
    ///
    /// Non-image objects are skipped while paging and do not count.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ListingStrategy for SdkListing {
    fn name(&self) -> &'static str {
        "sdk"
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(LIST_PAGE_SIZE);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let result = request
                .send()
                .await
                .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;

            keys.extend(
                result
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .filter(|key| is_image_key(key))
                    .map(str::to_string),
            );

            if keys.len() >= self.max_keys {
                keys.truncate(self.max_keys);
                break;
            }

            if result.is_truncated() == Some(true) {
                continuation_token = result.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(keys)
    }
}

#[derive(Deserialize)]
struct Manifest {
    images: Vec<String>,
}

/// Manifest object (`{"images": [...]}`) read through the PAR URL.
pub struct ManifestListing<F: ObjectFetcher> {
    fetcher: Arc<F>,
    manifest_url: String,
}

impl<F: ObjectFetcher> ManifestListing<F> {
    pub fn new(fetcher: Arc<F>, manifest_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            manifest_url: manifest_url.into(),
        }
    }
}

#[async_trait]
impl<F: ObjectFetcher + 'static> ListingStrategy for ManifestListing<F> {
    fn name(&self) -> &'static str {
        "manifest"
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let body = self
            .fetcher
            .fetch(&self.manifest_url, DEFAULT_FETCH_TIMEOUT)
            .await?;
        let manifest: Manifest =
            serde_json::from_slice(&body).map_err(|e| StorageError::Manifest(e.to_string()))?;
        Ok(manifest.images)
    }
}

/// Newline-separated key list in a local file.
pub struct FileListing {
    path: PathBuf,
}

impl FileListing {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ListingStrategy for FileListing {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {}", self.path.display(), e)))?;

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Fixed key list supplied through configuration (e.g. `IMAGE_LIST`).
pub struct StaticListing {
    keys: Vec<String>,
}

impl StaticListing {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    /// Parse a comma-separated list, skipping blank entries.
    pub fn from_comma_separated(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

#[async_trait]
impl ListingStrategy for StaticListing {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        if self.keys.is_empty() {
            return Err(StorageError::Io("configured image list is empty".to_string()));
        }
        Ok(self.keys.clone())
    }
}

/// Synthetic `image_001.jpg`… names; the last resort that always succeeds.
pub struct PlaceholderListing {
    count: usize,
}

impl PlaceholderListing {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Default for PlaceholderListing {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_COUNT)
    }
}

#[async_trait]
impl ListingStrategy for PlaceholderListing {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok((1..=self.count)
            .map(|i| format!("image_{:03}.jpg", i))
            .collect())
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Ordered chain of listing strategies.
#[derive(Default)]
pub struct ListingResolver {
    strategies: Vec<Box<dyn ListingStrategy>>,
}

impl ListingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy to the end of the chain.
    pub fn with_strategy(mut self, strategy: impl ListingStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the configured strategies, in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain and return the first successful, normalized listing.
    ///
    /// Returns an empty list only when every strategy fails.
    pub async fn resolve(&self) -> Vec<String> {
        for strategy in &self.strategies {
            debug!(source = strategy.name(), "Resolving image listing");
            match strategy.list().await {
                Ok(keys) => {
                    let raw_count = keys.len();
                    let images = normalize_listing(keys);
                    info!(
                        source = strategy.name(),
                        images = images.len(),
                        skipped = raw_count - images.len(),
                        "Resolved image listing"
                    );
                    return images;
                }
                Err(e) => {
                    warn!(source = strategy.name(), error = %e, "Listing source failed");
                }
            }
        }

        warn!("All listing sources failed, serving an empty gallery");
        Vec::new()
    }
}
