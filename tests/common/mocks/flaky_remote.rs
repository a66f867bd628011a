use async_trait::async_trait;
use field_sync::AppError;
use field_sync::application::ports::remote_store::{
    BatchOperation, RemoteDocument, RemoteStore, WriteBatch,
};
use field_sync::infrastructure::remote::InMemoryRemoteStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Remote store that rejects commits touching chosen work orders and can
/// hold every commit until released.
pub struct FlakyRemote {
    pub inner: InMemoryRemoteStore,
    rejected_work_orders: Mutex<HashSet<String>>,
    unreachable_documents: Mutex<HashSet<String>>,
    release: Option<Arc<Notify>>,
    get_calls: AtomicUsize,
    commit_calls: AtomicUsize,
}

impl FlakyRemote {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRemoteStore::new(),
            rejected_work_orders: Mutex::new(HashSet::new()),
            unreachable_documents: Mutex::new(HashSet::new()),
            release: None,
            get_calls: AtomicUsize::new(0),
            commit_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(release: Arc<Notify>) -> Self {
        Self {
            release: Some(release),
            ..Self::new()
        }
    }

    pub fn reject_work_order(&self, id: &str) {
        self.rejected_work_orders
            .lock()
            .expect("rejected lock")
            .insert(id.to_string());
    }

    pub fn accept_work_order(&self, id: &str) {
        self.rejected_work_orders
            .lock()
            .expect("rejected lock")
            .remove(id);
    }

    pub fn make_unreachable(&self, id: &str) {
        self.unreachable_documents
            .lock()
            .expect("unreachable lock")
            .insert(id.to_string());
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    fn rejects(&self, batch: &WriteBatch) -> Option<String> {
        let rejected = self.rejected_work_orders.lock().expect("rejected lock");
        batch.operations().iter().find_map(|operation| match operation {
            BatchOperation::Update { target, .. } if rejected.contains(&target.id) => {
                Some(target.id.clone())
            }
            _ => None,
        })
    }
}

#[async_trait]
impl RemoteStore for FlakyRemote {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<RemoteDocument>, AppError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let unreachable = self
            .unreachable_documents
            .lock()
            .expect("unreachable lock")
            .contains(id);
        if unreachable {
            return Err(AppError::RemoteFetchError(format!("{collection}/{id} unreachable")));
        }
        self.inner.get_document(collection, id).await
    }

    async fn list_subcollection(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
    ) -> Result<Vec<RemoteDocument>, AppError> {
        self.inner
            .list_subcollection(parent_collection, parent_id, child_collection)
            .await
    }

    fn new_document_id(&self, collection: &str) -> String {
        self.inner.new_document_id(collection)
    }

    fn begin_batch(&self) -> WriteBatch {
        self.inner.begin_batch()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            release.notified().await;
        }
        if let Some(id) = self.rejects(&batch) {
            return Err(AppError::RemoteCommitError(format!(
                "permission denied for work order {id}"
            )));
        }
        self.inner.commit(batch).await
    }
}
