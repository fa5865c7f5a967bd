//! Router configuration for Bucket Gallery.
//!
//! This module defines the HTTP routes and applies middleware for session
//! authentication, CORS and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                    - Health check (public)
//! /login                     - Login form and submit (public)
//! /logout                    - Clear session (public)
//! /                          - Gallery page (protected)
//! /api/images                - Paginated images as JSON (protected)
//! /api/image/{*name}         - Full-size image proxy (protected)
//! /api/image-info/{*name}    - Image metadata (protected)
//! /api/refresh-images        - Re-resolve the listing (protected)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bucket_gallery::server::routes::{create_router, RouterConfig};
//! use bucket_gallery::server::auth::SessionAuth;
//!
//! let auth = SessionAuth::new("my-secret-key", Duration::from_secs(86400))
//!     .with_password(Some("viewer-password"));
//! let config = RouterConfig::new(auth)
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(gallery_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{
    login_page_handler, login_submit_handler, logout_handler, session_middleware, SessionAuth,
};
use super::handlers::{
    health_handler, image_handler, image_info_handler, images_handler, index_handler,
    refresh_handler, AppState,
};
use crate::gallery::GalleryService;
use crate::storage::ObjectFetcher;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Session issuing and verification
    pub auth: SessionAuth,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    pub fn new(auth: SessionAuth) -> Self {
        Self {
            auth,
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Gallery and API routes sit behind [`session_middleware`]; health, login
/// and logout are public.
pub fn create_router<F>(gallery: GalleryService<F>, config: RouterConfig) -> Router
where
    F: ObjectFetcher + 'static,
{
    let app_state = AppState::new(gallery);
    let cors = build_cors_layer(&config);

    let protected_routes = Router::new()
        .route("/", get(index_handler::<F>))
        .route("/api/images", get(images_handler::<F>))
        .route("/api/image/{*name}", get(image_handler::<F>))
        .route("/api/image-info/{*name}", get(image_info_handler::<F>))
        .route("/api/refresh-images", get(refresh_handler::<F>))
        .with_state(app_state)
        .layer(middleware::from_fn_with_state(
            config.auth.clone(),
            session_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/login", get(login_page_handler).post(login_submit_handler))
        .route("/logout", get(logout_handler))
        .with_state(config.auth.clone());

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
