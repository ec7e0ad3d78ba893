use crate::db_operations::error::CollectionError;
use crate::db_operations::query::{DocumentQuery, Projection};
use crate::db_operations::write_ops::{BulkWriteResult, WriteOp};
use crate::error::ButtressResult;
use crate::schema::types::ObjectId;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

/// Top-level key stripped from a document re-read after a single insert.
pub const METADATA_KEY: &str = "metadata";

/// Storage handle for one resource collection.
///
/// Implementations must be safe to share between tasks; the engine never
/// locks around calls.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn find(
        &self,
        query: &DocumentQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>, CollectionError>;

    async fn find_one(
        &self,
        query: &DocumentQuery,
        projection: &Projection,
    ) -> Result<Option<Value>, CollectionError> {
        Ok(self.find(query, projection).await?.into_iter().next())
    }

    /// Applies `ops` in order.
    async fn bulk_write(&self, ops: Vec<WriteOp>) -> Result<BulkWriteResult, CollectionError>;

    async fn delete_one(&self, id: &ObjectId) -> Result<u64, CollectionError>;

    async fn delete_many(&self, query: &DocumentQuery) -> Result<u64, CollectionError>;

    async fn count(&self, query: &DocumentQuery) -> Result<u64, CollectionError>;
}

/// Result of [`add`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Exactly one document was inserted; this is it, as stored.
    Document(Value),
    /// Zero or several documents were inserted.
    Ids(Vec<ObjectId>),
}

/// Builds one document per body item and inserts them in one bulk write.
///
/// Items whose builder fails are logged and skipped. A single insert is
/// answered with the stored document (without its `metadata`); anything
/// else with the inserted ids.
pub async fn add<F>(collection: &dyn Collection, body: &Value, build: F) -> ButtressResult<AddOutcome>
where
    F: Fn(&Value) -> ButtressResult<Value>,
{
    let items: Vec<&Value> = match body {
        Value::Array(items) => items.iter().collect(),
        item => vec![item],
    };

    let mut ops = Vec::with_capacity(items.len());
    for item in items {
        match build(item) {
            Ok(document) => ops.push(WriteOp::insert(document)),
            Err(e) => warn!("Skipping item for {}: {}", collection.name(), e),
        }
    }

    let result = collection.bulk_write(ops).await?;
    debug!("Inserted {} documents into {}", result.inserted_ids.len(), collection.name());

    match result.inserted_ids.as_slice() {
        [id] => {
            let projection = Projection::none().exclude(METADATA_KEY);
            let document = collection
                .find_one(&DocumentQuery::by_id(id), &projection)
                .await?
                .unwrap_or(Value::Null);
            Ok(AddOutcome::Document(document))
        }
        _ => Ok(AddOutcome::Ids(result.inserted_ids)),
    }
}
