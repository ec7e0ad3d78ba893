//! Testing utilities: temporary databases and an in-memory collection that
//! records every bulk write it receives.

use crate::db_operations::{
    BulkWriteResult, Collection, CollectionError, DbOperations, DocumentQuery, Projection,
    SledCollection, WriteOp,
};
use crate::schema::registry::CompiledSchema;
use crate::schema::types::{ObjectId, SchemaDescription, SchemaError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct TestDatabaseFactory;

impl TestDatabaseFactory {
    /// Create temporary DbOperations for testing
    pub fn create_temp_db_ops() -> Result<DbOperations, CollectionError> {
        DbOperations::temporary()
    }

    /// Create a named collection in a fresh temporary database
    pub fn create_temp_collection(name: &str) -> Result<SledCollection, CollectionError> {
        Self::create_temp_db_ops()?.collection(name)
    }

    pub fn compile(description: SchemaDescription) -> Result<Arc<CompiledSchema>, SchemaError> {
        CompiledSchema::compile(description).map(Arc::new)
    }
}

/// In-memory [`Collection`] keeping every bulk write batch for inspection.
///
/// Documents are updated with the same operator semantics as the sled
/// backend, but without rollback: a failing op leaves earlier ops applied.
/// Set a failure message to make every bulk write fail.
#[derive(Default)]
pub struct RecordingCollection {
    name: String,
    documents: Mutex<Vec<Value>>,
    batches: Mutex<Vec<Vec<WriteOp>>>,
    failure: Mutex<Option<String>>,
}

impl RecordingCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Seeds a stored document; it must carry an `_id`.
    pub async fn insert_document(&self, document: Value) {
        self.documents.lock().await.push(document);
    }

    /// Every bulk write received so far, in order.
    pub async fn batches(&self) -> Vec<Vec<WriteOp>> {
        self.batches.lock().await.clone()
    }

    pub async fn documents(&self) -> Vec<Value> {
        self.documents.lock().await.clone()
    }

    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().await = Some(message.into());
    }
}

#[async_trait]
impl Collection for RecordingCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(
        &self,
        query: &DocumentQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>, CollectionError> {
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .filter(|document| query.matches(document))
            .map(|document| {
                let mut document = document.clone();
                projection.apply(&mut document);
                document
            })
            .collect())
    }

    async fn bulk_write(&self, ops: Vec<WriteOp>) -> Result<BulkWriteResult, CollectionError> {
        self.batches.lock().await.push(ops.clone());
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(CollectionError::Storage {
                operation: "bulk_write".to_string(),
                message,
            });
        }

        let mut documents = self.documents.lock().await;
        let mut result = BulkWriteResult::default();
        for op in ops {
            match op {
                WriteOp::InsertOne { mut document } => {
                    let id = match document.get("_id") {
                        Some(id) => ObjectId::from_value(id)
                            .map_err(|e| CollectionError::InvalidOperation(e.to_string()))?,
                        None => {
                            let id = ObjectId::new();
                            if let Value::Object(map) = &mut document {
                                map.insert("_id".to_string(), id.to_value());
                            }
                            id
                        }
                    };
                    documents.push(document);
                    result.inserted_ids.push(id);
                }
                WriteOp::UpdateOne { filter, update } => {
                    let query = DocumentQuery::by_id(&filter);
                    if let Some(document) = documents.iter_mut().find(|d| query.matches(d)) {
                        result.matched_count += 1;
                        if update.apply(document)? {
                            result.modified_count += 1;
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    async fn delete_one(&self, id: &ObjectId) -> Result<u64, CollectionError> {
        let query = DocumentQuery::by_id(id);
        let mut documents = self.documents.lock().await;
        match documents.iter().position(|d| query.matches(d)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, query: &DocumentQuery) -> Result<u64, CollectionError> {
        let mut documents = self.documents.lock().await;
        let before = documents.len();
        documents.retain(|d| !query.matches(d));
        Ok((before - documents.len()) as u64)
    }

    async fn count(&self, query: &DocumentQuery) -> Result<u64, CollectionError> {
        Ok(self.find(query, &Projection::none()).await?.len() as u64)
    }
}
