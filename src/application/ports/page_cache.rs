use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;

/// Request/response cache that keeps application routes servable offline.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Fetches and stores a single route. Each call succeeds or fails on its own.
    async fn add(&self, url: &str) -> Result<(), AppError>;
    async fn get(&self, url: &str) -> Option<Bytes>;
}

/// Produces the response body for a route when it is being cached.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError>;
}
