use thiserror::Error;

/// Errors that can occur when talking to object storage or reading a listing source.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Error from the S3-compatible SDK
    #[error("S3 error: {0}")]
    S3(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Network, timeout or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Manifest was fetched but does not contain a usable image list
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// Local filesystem error (image list file)
    #[error("I/O error: {0}")]
    Io(String),
}

impl StorageError {
    /// Whether the upstream reported the object as missing or unavailable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_) | StorageError::Status { .. })
    }
}

/// Errors that can occur while producing a thumbnail.
///
/// These never reach HTTP clients; the renderer logs them and yields no thumbnail.
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    /// Source object could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(#[from] StorageError),

    /// Source bytes are not a decodable image
    #[error("decode failed: {message}")]
    Decode { message: String },

    /// Re-encoding to JPEG failed
    #[error("encode failed: {message}")]
    Encode { message: String },
}
