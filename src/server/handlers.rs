//! HTTP request handlers for the gallery.
//!
//! # Endpoints
//!
//! - `GET /` - Gallery page
//! - `GET /api/images` - One page of images as JSON
//! - `GET /api/image/{*name}` - Full-size image bytes
//! - `GET /api/image-info/{*name}` - Size and content type of an image
//! - `GET /api/refresh-images` - Re-resolve the listing
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::StorageError;
use crate::gallery::{parse_page, GalleryPage, GalleryService, ImageInfo, MAX_PER_PAGE};
use crate::storage::ObjectFetcher;

use super::pages::gallery_page_html;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the gallery service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<F: ObjectFetcher> {
    pub gallery: Arc<GalleryService<F>>,
}

impl<F: ObjectFetcher> AppState<F> {
    pub fn new(gallery: GalleryService<F>) -> Self {
        Self {
            gallery: Arc::new(gallery),
        }
    }

    pub fn from_arc(gallery: Arc<GalleryService<F>>) -> Self {
        Self { gallery }
    }
}

impl<F: ObjectFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            gallery: Arc::clone(&self.gallery),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the gallery page and image API.
///
/// Values are kept as strings so malformed numbers fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQueryParams {
    /// 1-indexed page number (default: 1)
    #[serde(default)]
    pub page: Option<String>,

    /// Images per page, clamped to 1-100 (default: configured page size)
    #[serde(default)]
    pub per_page: Option<String>,
}

impl PageQueryParams {
    pub fn page(&self) -> usize {
        parse_page(self.page.as_deref())
    }

    /// Requested page size, if it parses.
    pub fn per_page(&self) -> Option<usize> {
        self.per_page
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|n| n.clamp(1, MAX_PER_PAGE as i64) as usize)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Response from the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,

    /// Number of images after the refresh
    pub count: usize,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Wrapper for image proxy/info errors to implement IntoResponse.
///
/// Upstream "not found" answers and invalid names become 404; anything else
/// (timeouts, refused connections) is a 500.
pub struct ImageError(pub StorageError);

impl IntoResponse for ImageError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = if self.0.is_not_found() {
            (
                StatusCode::NOT_FOUND,
                "not_found",
                "Image not found".to_string(),
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                self.0.to_string(),
            )
        };

        // Log based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self.0
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                self.0
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

impl From<StorageError> for ImageError {
    fn from(err: StorageError) -> Self {
        ImageError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Render the gallery page.
///
/// # Endpoint
///
/// `GET /?page={n}`
pub async fn index_handler<F: ObjectFetcher>(
    State(state): State<AppState<F>>,
    Query(query): Query<PageQueryParams>,
) -> Html<String> {
    let page = state.gallery.page(query.page(), None).await;
    Html(gallery_page_html(&page))
}

/// Return one page of images with thumbnails.
///
/// # Endpoint
///
/// `GET /api/images?page={n}&per_page={m}`
///
/// # Response
///
/// ```json
/// {
///   "images": [{"name": "a.jpg", "url": "https://...", "thumbnail": "data:image/jpeg;base64,..."}],
///   "pagination": {"current_page": 1, "per_page": 20, "total_images": 45, "total_pages": 3,
///                  "has_prev": false, "has_next": true}
/// }
/// ```
///
/// `thumbnail` is `null` for images that could not be rendered.
pub async fn images_handler<F: ObjectFetcher>(
    State(state): State<AppState<F>>,
    Query(query): Query<PageQueryParams>,
) -> Json<GalleryPage> {
    let page = state
        .gallery
        .page(query.page(), query.per_page())
        .await;

    debug!(
        page = page.pagination.current_page,
        images = page.images.len(),
        "Served image page"
    );

    Json(page)
}

/// Proxy the full-size image.
///
/// # Endpoint
///
/// `GET /api/image/{*name}`
///
/// # Response
///
/// - `200 OK`: image bytes, `Content-Type` from the extension
/// - `404 Not Found`: invalid name, or the object store did not return the image
/// - `500 Internal Server Error`: the object store could not be reached
pub async fn image_handler<F: ObjectFetcher>(
    State(state): State<AppState<F>>,
    Path(name): Path<String>,
) -> Result<Response, ImageError> {
    let image = state.gallery.fetch_image(&name).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.content_type)],
        image.data,
    )
        .into_response())
}

/// Report size and content type of an image.
///
/// # Endpoint
///
/// `GET /api/image-info/{*name}`
pub async fn image_info_handler<F: ObjectFetcher>(
    State(state): State<AppState<F>>,
    Path(name): Path<String>,
) -> Result<Json<ImageInfo>, ImageError> {
    let info = state.gallery.image_info(&name).await?;
    Ok(Json(info))
}

/// Force the listing to be resolved again.
///
/// # Endpoint
///
/// `GET /api/refresh-images`
pub async fn refresh_handler<F: ObjectFetcher>(
    State(state): State<AppState<F>>,
) -> Json<RefreshResponse> {
    let count = state.gallery.refresh().await;
    Json(RefreshResponse {
        message: "Image list refreshed successfully".to_string(),
        count,
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// ```json
/// {"status": "healthy", "version": "0.1.0"}
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
