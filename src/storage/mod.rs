//! Object storage access layer.
//!
//! - [`ObjectFetcher`] downloads objects (and HEADs them) by URL
//! - [`UrlResolver`] turns image keys into those URLs
//! - [`create_s3_client`] builds the SDK client used for authenticated listing

mod fetcher;
mod s3_client;
pub mod urls;

pub use fetcher::{
    HttpFetcher, ObjectFetcher, ObjectInfo, DEFAULT_FETCH_TIMEOUT, IMAGE_PROXY_TIMEOUT,
};
pub use s3_client::{compat_endpoint, create_s3_client};
pub use urls::{bucket_info_from_par, encode_key, par_base_url, BucketInfo, UrlResolver};
