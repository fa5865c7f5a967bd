//! Configuration management for Bucket Gallery.
//!
//! This module provides a CLI with subcommands:
//! - `serve` (default): Start the gallery server
//! - `list`: Resolve the image listing and print it
//!
//! Every flag has an environment fallback, and a `.env` file in the working
//! directory is loaded before parsing.
//!
//! # Environment Variables
//!
//! - `SECRET_KEY` - HMAC secret for session tokens (required for `serve`)
//! - `VIEWER_PASSWORD` - Shared login password (login disabled when unset)
//! - `GALLERY_HOST` / `GALLERY_PORT` - Bind address (default: 0.0.0.0:8000)
//! - `OCI_PAR_URL` - Pre-authenticated request URL for the bucket
//! - `OCI_NAMESPACE` / `OCI_BUCKET_NAME` / `OCI_REGION` - Bucket addressing
//! - `OCI_S3_ENDPOINT` - Override for the S3 compatibility endpoint
//! - `OCI_CONFIG_FILE` / `OCI_PROFILE` - Credentials file and profile for listing
//! - `GALLERY_IMAGE_LIST_FILE` / `IMAGE_LIST` - Local listing fallbacks

use std::path::PathBuf;
use std::sync::Arc;

use aws_sdk_s3::Client;
use clap::{Args, Parser, Subcommand};

use crate::gallery::{
    FileListing, ListingResolver, ManifestListing, PlaceholderListing, SdkListing, StaticListing,
    DEFAULT_MAX_KEYS, DEFAULT_PER_PAGE, DEFAULT_THUMBNAIL_CACHE_CAPACITY,
    DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_SIZE, MAX_PER_PAGE,
};
use crate::storage::urls::DEFAULT_REGION;
use crate::storage::{bucket_info_from_par, compat_endpoint, BucketInfo, ObjectFetcher, UrlResolver};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default session lifetime in seconds (24 hours).
pub const DEFAULT_SESSION_TTL: u64 = 86_400;

/// Default local listing file.
pub const DEFAULT_IMAGE_LIST_FILE: &str = "image_list.txt";

// =============================================================================
// CLI Structure
// =============================================================================

/// Bucket Gallery - A password-gated web gallery for object storage.
///
/// Lists the images in an OCI Object Storage bucket and serves them as a
/// paginated gallery with generated thumbnails.
#[derive(Parser, Debug, Clone)]
#[command(name = "bucket-gallery")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Serve options used when no subcommand is given.
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the gallery server (default)
    Serve(ServeConfig),

    /// Resolve the image listing and print every key
    List(ListConfig),
}

// =============================================================================
// Storage Configuration
// =============================================================================

/// Where images live and how to enumerate them.
#[derive(Args, Debug, Clone)]
pub struct StorageConfig {
    /// Pre-authenticated request URL for the bucket.
    ///
    /// Namespace and bucket found in the URL path take precedence over
    /// --namespace and --bucket.
    #[arg(long, env = "OCI_PAR_URL")]
    pub par_url: Option<String>,

    /// Object Storage namespace.
    #[arg(long, env = "OCI_NAMESPACE")]
    pub namespace: Option<String>,

    /// Bucket name.
    #[arg(long, env = "OCI_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// OCI region.
    #[arg(long, default_value = DEFAULT_REGION, env = "OCI_REGION")]
    pub region: String,

    /// S3 compatibility endpoint.
    ///
    /// Defaults to https://{namespace}.compat.objectstorage.{region}.oraclecloud.com
    #[arg(long, env = "OCI_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Credentials file for the S3 compatibility API (AWS credentials format).
    #[arg(long, env = "OCI_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Profile to select from the credentials file.
    #[arg(long, env = "OCI_PROFILE")]
    pub profile: Option<String>,

    /// Local newline-separated list of image keys.
    #[arg(long, default_value = DEFAULT_IMAGE_LIST_FILE, env = "GALLERY_IMAGE_LIST_FILE")]
    pub image_list_file: PathBuf,

    /// Comma-separated list of image keys.
    #[arg(long, env = "IMAGE_LIST")]
    pub image_list: Option<String>,

    /// Maximum number of image keys collected from the SDK listing.
    ///
    /// Objects without an image extension do not count toward the limit.
    #[arg(long, default_value_t = DEFAULT_MAX_KEYS, env = "GALLERY_MAX_KEYS")]
    pub max_keys: usize,
}

impl StorageConfig {
    /// Namespace and bucket, with values from the PAR URL taking precedence.
    pub fn bucket_info(&self) -> BucketInfo {
        let configured = BucketInfo {
            namespace: non_empty(self.namespace.as_deref()),
            bucket: non_empty(self.bucket.as_deref()),
        };

        let Some(par_url) = self.par_url() else {
            return configured;
        };

        let from_par = bucket_info_from_par(par_url);
        BucketInfo {
            namespace: from_par.namespace.or(configured.namespace),
            bucket: from_par.bucket.or(configured.bucket),
        }
    }

    /// The PAR URL, ignoring blank values.
    pub fn par_url(&self) -> Option<&str> {
        self.par_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Build the URL resolver: PAR mode when a PAR URL is set, bucket mode otherwise.
    pub fn url_resolver(&self) -> Result<UrlResolver, String> {
        if let Some(par_url) = self.par_url() {
            return UrlResolver::from_par(par_url).map_err(|e| format!("Invalid PAR URL: {}", e));
        }

        let info = self.bucket_info();
        Ok(UrlResolver::for_bucket(
            &self.region,
            info.namespace.unwrap_or_default(),
            info.bucket.unwrap_or_default(),
        ))
    }

    /// Whether images can be addressed at all.
    pub fn has_image_source(&self) -> bool {
        let info = self.bucket_info();
        self.par_url().is_some() || (info.namespace.is_some() && info.bucket.is_some())
    }

    /// S3 compatibility endpoint, when a namespace is known or one was configured.
    pub fn s3_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = non_empty(self.s3_endpoint.as_deref()) {
            return Some(endpoint);
        }
        self.bucket_info()
            .namespace
            .map(|ns| compat_endpoint(&ns, &self.region))
    }

    /// Assemble the listing chain.
    ///
    /// The SDK strategy is only added when a client is supplied and a bucket is
    /// known; the manifest strategy only with a PAR URL; the environment list
    /// only when non-empty. The file and placeholder strategies are always present.
    pub fn listing_resolver<F>(
        &self,
        sdk_client: Option<Client>,
        fetcher: Arc<F>,
        urls: &UrlResolver,
    ) -> ListingResolver
    where
        F: ObjectFetcher + 'static,
    {
        let mut resolver = ListingResolver::new();

        if let (Some(client), Some(bucket)) = (sdk_client, self.bucket_info().bucket) {
            resolver =
                resolver.with_strategy(SdkListing::new(client, bucket).with_max_keys(self.max_keys));
        }

        if let Some(manifest_url) = urls.manifest_url() {
            resolver = resolver.with_strategy(ManifestListing::new(fetcher, manifest_url));
        }

        resolver = resolver.with_strategy(FileListing::new(&self.image_list_file));

        if let Some(list) = non_empty(self.image_list.as_deref()) {
            resolver = resolver.with_strategy(StaticListing::from_comma_separated(&list));
        }

        resolver.with_strategy(PlaceholderListing::default())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Serve Command Configuration
// =============================================================================

/// Configuration for the serve command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GALLERY_PORT")]
    pub port: u16,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for signing session cookies.
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Shared password for the login page.
    ///
    /// When unset, the login page reports that the server is not configured.
    #[arg(long, env = "VIEWER_PASSWORD", hide_env_values = true)]
    pub viewer_password: Option<String>,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL, env = "GALLERY_SESSION_TTL")]
    pub session_ttl: u64,

    // =========================================================================
    // Gallery Configuration
    // =========================================================================
    /// Images per gallery page.
    #[arg(long, default_value_t = DEFAULT_PER_PAGE, env = "GALLERY_PER_PAGE")]
    pub per_page: usize,

    /// Thumbnail bounding box edge in pixels.
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_SIZE, env = "GALLERY_THUMBNAIL_SIZE")]
    pub thumbnail_size: u32,

    /// JPEG quality for thumbnails (1-100).
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_QUALITY, env = "GALLERY_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Thumbnail cache capacity in bytes (0 disables the cache).
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_CACHE_CAPACITY, env = "GALLERY_CACHE_THUMBNAILS")]
    pub cache_thumbnails: usize,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    #[command(flatten)]
    pub storage: StorageConfig,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret_key().is_none() {
            return Err(
                "No secret key provided. Set --secret-key or SECRET_KEY to sign session cookies"
                    .to_string(),
            );
        }

        if self.session_ttl == 0 {
            return Err("session_ttl must be greater than 0".to_string());
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(format!("per_page must be between 1 and {}", MAX_PER_PAGE));
        }

        if self.thumbnail_size == 0 {
            return Err("thumbnail_size must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        self.storage.url_resolver()?;

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The secret key, ignoring blank values.
    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref().filter(|s| !s.is_empty())
    }

    /// The viewer password, ignoring blank values.
    pub fn viewer_password(&self) -> Option<&str> {
        self.viewer_password.as_deref().filter(|s| !s.is_empty())
    }
}

// =============================================================================
// List Command Configuration
// =============================================================================

/// Configuration for the list command.
#[derive(Args, Debug, Clone)]
pub struct ListConfig {
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Print only the number of images.
    #[arg(long, default_value_t = false)]
    pub count_only: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
