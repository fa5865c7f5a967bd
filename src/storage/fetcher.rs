use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, StatusCode};

use crate::error::StorageError;

/// Timeout for manifest, thumbnail source and HEAD requests.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for proxying a full-size image to the browser.
pub const IMAGE_PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata returned by a HEAD request against an object URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object size in bytes (0 when the upstream omits Content-Length)
    pub size: u64,

    /// Upstream Content-Type, if any
    pub content_type: Option<String>,
}

/// Trait for fetching objects by their resolved URL.
///
/// The gallery only needs two operations from the object store's public
/// surface: download the bytes and read the headers. Implementations must be
/// thread-safe; the production one wraps a shared `reqwest::Client`.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Download the object at `url`, failing on any non-success status.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bytes, StorageError>;

    /// Issue a HEAD request for the object at `url`.
    async fn head(&self, url: &str, timeout: Duration) -> Result<ObjectInfo, StorageError>;
}

/// `reqwest`-backed implementation of [`ObjectFetcher`].
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Wrap an existing client (shares its connection pool).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn status_error(url: &str, status: StatusCode) -> StorageError {
    if status == StatusCode::NOT_FOUND {
        StorageError::NotFound(url.to_string())
    } else {
        StorageError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }
}

#[async_trait]
impl ObjectFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }

        response
            .bytes()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn head(&self, url: &str, timeout: Duration) -> Result<ObjectInfo, StorageError> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }

        // HEAD bodies are empty, so read the header rather than content_length()
        let headers = response.headers();
        let size = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(ObjectInfo { size, content_type })
    }
}
