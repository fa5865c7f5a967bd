//! Bucket Gallery - A password-gated web gallery for object storage.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bucket_gallery::{
    config::{Cli, Command, ListConfig, ServeConfig, StorageConfig},
    create_router, create_s3_client,
    gallery::{GalleryService, ListingResolver, ThumbnailCache, ThumbnailEncoder},
    server::{RouterConfig, SessionAuth},
    storage::{HttpFetcher, UrlResolver},
};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment alone may be enough
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::List(config) => run_list(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let urls = match config.storage.url_resolver() {
        Ok(urls) => urls,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_banner();
    log_storage_config(&config.storage, &urls);

    if config.viewer_password().is_some() {
        info!("  Login: enabled");
    } else {
        warn!("  Login: DISABLED - no viewer password configured");
        warn!("        Set VIEWER_PASSWORD to allow viewers to sign in");
    }
    info!(
        "  Thumbnails: {}px, quality {}, {}MB cache",
        config.thumbnail_size,
        config.jpeg_quality,
        config.cache_thumbnails / (1024 * 1024)
    );

    let fetcher = Arc::new(HttpFetcher::new());
    let listing = build_listing(&config.storage, Arc::clone(&fetcher), &urls).await;
    info!("  Listing sources: {}", listing.strategy_names().join(" → "));

    let gallery = GalleryService::new(fetcher, urls, listing)
        .with_per_page(config.per_page)
        .with_thumbnail_size(config.thumbnail_size)
        .with_thumbnails(
            ThumbnailEncoder::new(config.jpeg_quality),
            ThumbnailCache::with_capacity(config.cache_thumbnails),
        );

    // Resolve the listing up front so the first page load is fast
    info!("");
    info!("Resolving image list...");
    let images = gallery.images().await;
    info!("  Found {} image(s)", images.len());

    let router = create_router(gallery, build_router_config(&config));
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Open the gallery in your browser:");
    info!("    open http://{}/", addr);
    info!("");
    info!("  Health check:");
    info!("    curl http://{}/health", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("┌─┐┌─┐┬  ┬  ┌─┐┬─┐┬ ┬");
    info!("│ ┬├─┤│  │  ├┤ ├┬┘└┬┘");
    info!("└─┘┴ ┴┴─┘┴─┘└─┘┴└─ ┴ ");
    info!("  bucket-gallery v{}", version);
    info!("");
}

fn log_storage_config(storage: &StorageConfig, urls: &UrlResolver) {
    let bucket_info = storage.bucket_info();

    info!("Configuration:");
    match urls {
        UrlResolver::Par { base_url, .. } => info!("  PAR base: {}", base_url),
        UrlResolver::Bucket { .. } => info!("  Object URL base: {}", urls.base_url()),
    }
    info!(
        "  Namespace: {}",
        bucket_info.namespace.as_deref().unwrap_or("(not set)")
    );
    info!(
        "  Bucket: {}",
        bucket_info.bucket.as_deref().unwrap_or("(not set)")
    );
    info!("  Region: {}", storage.region);

    if !storage.has_image_source() {
        warn!("  No PAR URL or namespace/bucket configured; image URLs will not resolve");
    }
}

/// Build the listing chain, creating an SDK client when the bucket is addressable.
async fn build_listing(
    storage: &StorageConfig,
    fetcher: Arc<HttpFetcher>,
    urls: &UrlResolver,
) -> ListingResolver {
    let has_bucket = storage.bucket_info().bucket.is_some();

    let sdk_client = match (has_bucket, storage.s3_endpoint()) {
        (true, Some(endpoint)) => {
            info!("  S3 endpoint: {}", endpoint);
            Some(
                create_s3_client(
                    &endpoint,
                    &storage.region,
                    storage.config_file.as_deref(),
                    storage.profile.as_deref(),
                )
                .await,
            )
        }
        _ => None,
    };

    storage.listing_resolver(sdk_client, fetcher, urls)
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "bucket_gallery=debug,tower_http=debug"
    } else {
        "bucket_gallery=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    // validate() guarantees the secret is present
    let auth = SessionAuth::new(
        config.secret_key().unwrap_or_default(),
        Duration::from_secs(config.session_ttl),
    )
    .with_password(config.viewer_password());

    let mut router_config = RouterConfig::new(auth);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// List Command
// =============================================================================

async fn run_list(config: ListConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    let urls = match config.storage.url_resolver() {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let fetcher = Arc::new(HttpFetcher::new());
    let listing = build_listing(&config.storage, fetcher, &urls).await;
    let images = listing.resolve().await;

    if config.count_only {
        println!("{}", images.len());
        return ExitCode::SUCCESS;
    }

    if images.is_empty() {
        println!("(no images found)");
    } else {
        for image in &images {
            println!("{}", image);
        }
        println!();
        println!("Total: {} image(s)", images.len());
    }

    ExitCode::SUCCESS
}
