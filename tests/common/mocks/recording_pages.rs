use async_trait::async_trait;
use bytes::Bytes;
use field_sync::AppError;
use field_sync::application::ports::page_cache::PageSource;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingPageSource {
    fetched: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_route(&self, url: &str) {
        self.failing
            .lock()
            .expect("failing lock")
            .insert(url.to_string());
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().expect("fetched lock").clone()
    }
}

#[async_trait]
impl PageSource for RecordingPageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError> {
        self.fetched
            .lock()
            .expect("fetched lock")
            .push(url.to_string());
        if self.failing.lock().expect("failing lock").contains(url) {
            return Err(AppError::RemoteFetchError(format!("{url} returned 503")));
        }
        Ok(Bytes::from(format!("page {url}")))
    }
}
