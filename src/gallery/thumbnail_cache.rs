//! Byte-bounded LRU cache for rendered thumbnails.
//!
//! Rendering a thumbnail costs a full download plus a decode, so a gallery
//! page that is revisited should not pay that again. Entries are keyed by the
//! image key and the render parameters; total JPEG bytes are capped and the
//! least-recently-used thumbnails are evicted first.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

use super::thumbnail::Thumbnail;

/// Default cache capacity: 32MB of encoded thumbnails.
pub const DEFAULT_THUMBNAIL_CACHE_CAPACITY: usize = 32 * 1024 * 1024;

/// Bound on entry count, independent of byte size.
const DEFAULT_MAX_ENTRIES: usize = 4096;

/// Cache key for a rendered thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub image_key: Arc<str>,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl ThumbnailKey {
    pub fn new(image_key: impl Into<Arc<str>>, max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            image_key: image_key.into(),
            max_width,
            max_height,
            quality,
        }
    }
}

struct Inner {
    entries: LruCache<ThumbnailKey, Thumbnail>,
    current_size: usize,
}

/// LRU cache of thumbnails with a byte capacity.
///
/// A capacity of 0 disables caching: `put` becomes a no-op.
pub struct ThumbnailCache {
    inner: Mutex<Inner>,
    max_size: usize,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_THUMBNAIL_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `max_size` bytes of thumbnails.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(max_entries),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// Look up a thumbnail, marking it recently used.
    pub async fn get(&self, key: &ThumbnailKey) -> Option<Thumbnail> {
        let mut inner = self.inner.lock().await;
        inner.entries.get(key).cloned()
    }

    /// Store a thumbnail, evicting LRU entries until within capacity.
    ///
    /// Thumbnails larger than the whole cache are not stored.
    pub async fn put(&self, key: ThumbnailKey, thumbnail: Thumbnail) {
        let size = thumbnail.len();
        if size > self.max_size {
            return;
        }

        let mut inner = self.inner.lock().await;

        if let Some(old_size) = inner.entries.peek(&key).map(Thumbnail::len) {
            inner.current_size = inner.current_size.saturating_sub(old_size);
        }

        // push() reports entries displaced by the entry-count bound too
        if let Some((evicted_key, evicted)) = inner.entries.push(key.clone(), thumbnail) {
            if evicted_key != key {
                inner.current_size = inner.current_size.saturating_sub(evicted.len());
            }
        }
        inner.current_size += size;

        while inner.current_size > self.max_size {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => {
                    inner.current_size = inner.current_size.saturating_sub(evicted.len());
                }
                None => break,
            }
        }
    }

    /// Drop every cached thumbnail.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.current_size = 0;
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// Total bytes of cached thumbnails.
    pub async fn size(&self) -> usize {
        self.inner.lock().await.current_size
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::new()
    }
}
