//! Object URL composition.
//!
//! Images are addressed either through a pre-authenticated request (PAR) URL
//! or through the public Object Storage URL template for a namespace/bucket
//! pair. Both are pure string operations; nothing here touches the network.
//!
//! ```text
//! PAR:       https://objectstorage.{region}.oraclecloud.com/p/{token}/n/{ns}/b/{bucket}/o/{key}
//! Namespace: https://objectstorage.{region}.oraclecloud.com/n/{ns}/b/{bucket}/o/{key}
//! ```

use url::{Position, Url};

/// Default OCI region when none is configured.
pub const DEFAULT_REGION: &str = "us-ashburn-1";

/// Name of the manifest object looked up under the PAR base.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Namespace and bucket extracted from a PAR URL path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketInfo {
    pub namespace: Option<String>,
    pub bucket: Option<String>,
}

/// Resolves image keys to fetchable URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlResolver {
    /// Objects are read through a pre-authenticated request URL.
    Par {
        /// The PAR URL exactly as configured
        par_url: String,
        /// `scheme://host/path` of the PAR URL without query or trailing slash
        base_url: String,
    },

    /// Objects are read through the public namespace/bucket URL template.
    Bucket {
        region: String,
        namespace: String,
        bucket: String,
    },
}

impl UrlResolver {
    /// Create a resolver from a PAR URL.
    pub fn from_par(par_url: &str) -> Result<Self, url::ParseError> {
        let base_url = par_base_url(par_url)?;
        Ok(UrlResolver::Par {
            par_url: par_url.to_string(),
            base_url,
        })
    }

    /// Create a resolver for a namespace/bucket pair in a region.
    pub fn for_bucket(
        region: impl Into<String>,
        namespace: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        UrlResolver::Bucket {
            region: region.into(),
            namespace: namespace.into(),
            bucket: bucket.into(),
        }
    }

    /// The configured PAR URL, if this resolver is PAR-based.
    pub fn par_url(&self) -> Option<&str> {
        match self {
            UrlResolver::Par { par_url, .. } => Some(par_url),
            UrlResolver::Bucket { .. } => None,
        }
    }

    /// Prefix every object URL starts with (no trailing slash).
    pub fn base_url(&self) -> String {
        match self {
            UrlResolver::Par { base_url, .. } => base_url.clone(),
            UrlResolver::Bucket {
                region,
                namespace,
                bucket,
            } => format!(
                "https://objectstorage.{}.oraclecloud.com/n/{}/b/{}/o",
                region, namespace, bucket
            ),
        }
    }

    /// Full URL for an image key.
    pub fn image_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url(), encode_key(key))
    }

    /// URL of the manifest object. Only PAR-based resolvers have one.
    pub fn manifest_url(&self) -> Option<String> {
        match self {
            UrlResolver::Par { base_url, .. } => Some(format!("{}/{}", base_url, MANIFEST_FILE)),
            UrlResolver::Bucket { .. } => None,
        }
    }
}

/// Strip the query string, fragment and trailing slash from a PAR URL.
pub fn par_base_url(par_url: &str) -> Result<String, url::ParseError> {
    let parsed = Url::parse(par_url)?;
    Ok(parsed[..Position::AfterPath].trim_end_matches('/').to_string())
}

/// Extract namespace and bucket from `/n/{namespace}/b/{bucket}` path segments.
///
/// Returns empty fields for URLs that cannot be parsed or do not follow the
/// Object Storage path layout.
pub fn bucket_info_from_par(par_url: &str) -> BucketInfo {
    let mut info = BucketInfo::default();
    let Ok(parsed) = Url::parse(par_url) else {
        return info;
    };
    let Some(segments) = parsed.path_segments() else {
        return info;
    };

    let segments: Vec<&str> = segments.collect();
    for (i, segment) in segments.iter().enumerate() {
        let next = segments.get(i + 1).filter(|s| !s.is_empty());
        match (*segment, next) {
            ("n", Some(ns)) => info.namespace = Some((*ns).to_string()),
            ("b", Some(bucket)) => {
                info.bucket = Some((*bucket).to_string());
                break;
            }
            _ => {}
        }
    }
    info
}

/// Percent-encode each path segment of a key, keeping `/` separators.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
