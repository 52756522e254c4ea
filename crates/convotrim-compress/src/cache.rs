//! Bounded in-memory cache of summarized message lists

use crate::types::Fingerprint;
use convotrim_core::Message;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_CAPACITY: usize = 100;

/// Shared summary cache.
///
/// Cloning yields another handle to the same entries, so several
/// optimizations can run against one cache. Eviction drops the least
/// recently used fingerprint once `capacity` entries are held.
#[derive(Debug, Clone)]
pub struct SummaryCache {
    entries: Arc<Mutex<LruCache<Fingerprint, Vec<Message>>>>,
}

impl SummaryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn get(&self, key: &Fingerprint) -> Option<Vec<Message>> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Store a result; identical fingerprints overwrite (last writer wins)
    pub async fn insert(&self, key: Fingerprint, messages: Vec<Message>) {
        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(key, messages) {
            if evicted != key {
                tracing::debug!(
                    count = evicted.message_count,
                    "evicted summary cache entry"
                );
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
