use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Builds a document from a JSON object literal; non-objects yield empty data.
    pub fn from_value(id: impl Into<String>, value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, data)
    }

    /// Deserializes the document into a typed record, injecting the document id.
    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T, AppError> {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// Field check the remote store evaluates against the stored document before
/// applying an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub field: String,
    pub one_of: Vec<Value>,
}

impl Precondition {
    pub fn one_of(field: impl Into<String>, allowed: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            one_of: allowed,
        }
    }

    /// A missing field never matches.
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        document
            .get(&self.field)
            .is_some_and(|value| self.one_of.contains(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    Set {
        target: DocumentRef,
        data: Map<String, Value>,
    },
    Update {
        target: DocumentRef,
        data: Map<String, Value>,
        precondition: Option<Precondition>,
    },
}

impl BatchOperation {
    pub fn target(&self) -> &DocumentRef {
        match self {
            BatchOperation::Set { target, .. } | BatchOperation::Update { target, .. } => target,
        }
    }
}

/// Writes that the remote store must apply all together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    operations: Vec<BatchOperation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites the target document.
    pub fn set(&mut self, target: DocumentRef, data: Map<String, Value>) -> &mut Self {
        self.operations.push(BatchOperation::Set { target, data });
        self
    }

    /// Merges fields into an existing document; the commit fails if it is missing.
    pub fn update(&mut self, target: DocumentRef, data: Map<String, Value>) -> &mut Self {
        self.operations.push(BatchOperation::Update {
            target,
            data,
            precondition: None,
        });
        self
    }

    /// Like [`WriteBatch::update`], but the whole batch is rejected unless the
    /// stored document satisfies `precondition`.
    pub fn update_if(
        &mut self,
        target: DocumentRef,
        data: Map<String, Value>,
        precondition: Precondition,
    ) -> &mut Self {
        self.operations.push(BatchOperation::Update {
            target,
            data,
            precondition: Some(precondition),
        });
        self
    }

    pub fn operations(&self) -> &[BatchOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Authoritative document store the device reconciles with.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<RemoteDocument>, AppError>;

    async fn list_subcollection(
        &self,
        parent_collection: &str,
        parent_id: &str,
        child_collection: &str,
    ) -> Result<Vec<RemoteDocument>, AppError>;

    /// Allocates a fresh opaque id for a new document in `collection`.
    fn new_document_id(&self, collection: &str) -> String;

    fn begin_batch(&self) -> WriteBatch;

    /// Applies every operation of the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError>;
}
