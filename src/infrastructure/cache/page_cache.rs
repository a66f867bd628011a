use super::memory_cache::MemoryCacheService;
use crate::application::ports::page_cache::{PageCache, PageSource};
use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Route cache backed by memory. Bodies come from a `PageSource` at `add` time.
pub struct MemoryPageCache {
    source: Arc<dyn PageSource>,
    pages: MemoryCacheService<Bytes>,
}

impl MemoryPageCache {
    pub fn new(source: Arc<dyn PageSource>, ttl_seconds: u64) -> Self {
        Self {
            source,
            pages: MemoryCacheService::new(ttl_seconds),
        }
    }

    pub async fn cached_routes(&self) -> Vec<String> {
        self.pages.keys().await
    }

    pub async fn evict(&self, url: &str) {
        self.pages.delete(url).await;
    }

    pub async fn clear(&self) {
        self.pages.clear().await;
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn add(&self, url: &str) -> Result<(), AppError> {
        let body = self.source.fetch(url).await?;
        let evicted = self.pages.cleanup_expired().await;
        if evicted > 0 {
            tracing::debug!(target: "offline::page_cache", evicted, "expired routes evicted");
        }
        self.pages.set(url.to_string(), body).await;
        tracing::trace!(target: "offline::page_cache", url, "route cached");
        Ok(())
    }

    async fn get(&self, url: &str) -> Option<Bytes> {
        self.pages.get(url).await
    }
}

/// Source that renders a fixed placeholder body per route.
pub struct StaticPageSource;

#[async_trait]
impl PageSource for StaticPageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError> {
        if !url.starts_with('/') {
            return Err(AppError::RemoteFetchError(format!(
                "route {url} is not an application path"
            )));
        }
        Ok(Bytes::from(format!("<!doctype html><!-- {url} -->")))
    }
}
