//! In-memory image list cache.
//!
//! The listing is resolved once, on first access, and then served from memory
//! until a caller asks for a refresh. Readers share an `Arc<[String]>` so a page
//! request never clones the whole list.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::listing::ListingResolver;

/// A resolved, sorted image list.
pub type ImageList = Arc<[String]>;

/// Lazily populated cache over a [`ListingResolver`].
pub struct ImageListCache {
    resolver: ListingResolver,
    list: RwLock<Option<ImageList>>,
}

impl ImageListCache {
    pub fn new(resolver: ListingResolver) -> Self {
        Self {
            resolver,
            list: RwLock::new(None),
        }
    }

    /// Get the image list, resolving it when nothing is cached or when
    /// `force_refresh` is set.
    pub async fn get(&self, force_refresh: bool) -> ImageList {
        if !force_refresh {
            if let Some(list) = self.list.read().await.as_ref() {
                return Arc::clone(list);
            }
        }

        let mut guard = self.list.write().await;

        // Another request may have populated the list while we waited
        if !force_refresh {
            if let Some(list) = guard.as_ref() {
                return Arc::clone(list);
            }
        }

        debug!(force_refresh, "Resolving image list");
        let list: ImageList = self.resolver.resolve().await.into();
        *guard = Some(Arc::clone(&list));
        list
    }

    /// The cached list, without resolving.
    pub async fn cached(&self) -> Option<ImageList> {
        self.list.read().await.clone()
    }

    /// Drop the cached list; the next `get` resolves again.
    pub async fn invalidate(&self) {
        *self.list.write().await = None;
    }

    pub fn resolver(&self) -> &ListingResolver {
        &self.resolver
    }
}
