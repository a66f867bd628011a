use crate::application::ports::remote_store::{
    BatchOperation, DocumentRef, RemoteDocument, RemoteStore, WriteBatch,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

type Collection = BTreeMap<String, Map<String, Value>>;

pub fn subcollection_path(parent_collection: &str, parent_id: &str, child: &str) -> String {
    format!("{parent_collection}/{parent_id}/{child}")
}

/// In-process document store with all-or-nothing batch commits.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    collections: RwLock<HashMap<String, Collection>>,
    commits: AtomicU64,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or overwrites a document. Non-object values are stored as empty documents.
    pub async fn insert_document(&self, collection: &str, id: &str, value: Value) {
        let data = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    pub async fn document(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub async fn documents(&self, collection: &str) -> Vec<RemoteDocument> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| RemoteDocument::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of batches applied so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<RemoteDocument>, AppError> {
        Ok(self
            .document(collection, id)
            .await
            .map(|data| RemoteDocument::new(id, data)))
    }

    async fn list_subcollection(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
    ) -> Result<Vec<RemoteDocument>, AppError> {
        let path = subcollection_path(parent_collection, parent_id, child_collection);
        Ok(self.documents(&path).await)
    }

    fn new_document_id(&self, _collection: &str) -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn begin_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;

        for operation in batch.operations() {
            let BatchOperation::Update {
                target,
                precondition,
                ..
            } = operation
            else {
                continue;
            };
            let Some(existing) = lookup(&collections, target) else {
                return Err(AppError::RemoteCommitError(format!(
                    "no document to update at {}/{}",
                    target.collection, target.id
                )));
            };
            if let Some(precondition) = precondition
                && !precondition.matches(existing)
            {
                return Err(AppError::RemoteCommitError(format!(
                    "conflicting state at {}/{}: {} is {}",
                    target.collection,
                    target.id,
                    precondition.field,
                    existing.get(&precondition.field).unwrap_or(&Value::Null)
                )));
            }
        }

        for operation in batch.into_operations() {
            match operation {
                BatchOperation::Set { target, data } => {
                    collections
                        .entry(target.collection)
                        .or_default()
                        .insert(target.id, data);
                }
                BatchOperation::Update { target, data, .. } => {
                    if let Some(existing) = collections
                        .get_mut(&target.collection)
                        .and_then(|docs| docs.get_mut(&target.id))
                    {
                        existing.extend(data);
                    }
                }
            }
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn lookup<'a>(
    collections: &'a HashMap<String, Collection>,
    target: &DocumentRef,
) -> Option<&'a Map<String, Value>> {
    collections
        .get(&target.collection)
        .and_then(|docs| docs.get(&target.id))
}
