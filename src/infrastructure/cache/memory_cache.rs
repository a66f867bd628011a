use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
struct CacheEntry<T> {
    data: T,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Keyed in-memory store whose entries expire after a TTL.
pub struct MemoryCacheService<T: Clone> {
    cache: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    default_ttl: Duration,
}

impl<T> MemoryCacheService<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl_seconds: u64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    pub async fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let entry = CacheEntry {
            data: value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.cache.write().await.insert(key, entry);
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.data.clone())
    }

    pub async fn delete(&self, key: &str) {
        self.cache.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.is_live(now));
        before - cache.len()
    }

    /// Keys of live entries, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let cache = self.cache.read().await;
        let mut keys: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
