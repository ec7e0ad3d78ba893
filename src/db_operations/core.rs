use super::collection::Collection;
use super::error::CollectionError;
use super::query::{DocumentQuery, Projection};
use super::write_ops::{BulkWriteResult, WriteOp};
use crate::schema::types::ObjectId;
use async_trait::async_trait;
use log::{debug, trace};
use serde_json::Value;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;

const ID_KEY: &str = "_id";

/// Owns the sled database and hands out one tree per collection.
#[derive(Clone)]
pub struct DbOperations {
    /// The underlying sled database instance
    db: sled::Db,
}

impl DbOperations {
    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }

    /// Opens (or creates) a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollectionError> {
        let db = sled::open(path).map_err(CollectionError::from_sled("open"))?;
        Ok(Self::new(db))
    }

    /// In-memory database removed on drop.
    pub fn temporary() -> Result<Self, CollectionError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(CollectionError::from_sled("open"))?;
        Ok(Self::new(db))
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn collection(&self, name: &str) -> Result<SledCollection, CollectionError> {
        let tree = self
            .db
            .open_tree(name)
            .map_err(CollectionError::from_sled("open_tree"))?;
        Ok(SledCollection {
            name: name.to_string(),
            tree,
        })
    }

    /// Names of the collections created so far.
    pub fn collection_names(&self) -> Vec<String> {
        self.db
            .tree_names()
            .into_iter()
            .map(|name| String::from_utf8_lossy(&name).to_string())
            .filter(|name| name != "__sled__default")
            .collect()
    }
}

/// A collection stored as one sled tree: documents keyed by their id bytes,
/// encoded as JSON.
#[derive(Clone)]
pub struct SledCollection {
    name: String,
    tree: sled::Tree,
}

impl SledCollection {
    fn decode(bytes: &[u8]) -> Result<Value, CollectionError> {
        serde_json::from_slice(bytes).map_err(CollectionError::from_serde("decode document"))
    }

    fn encode(document: &Value) -> Result<Vec<u8>, CollectionError> {
        serde_json::to_vec(document).map_err(CollectionError::from_serde("encode document"))
    }

    /// Every stored document matching `query`, with its key.
    fn scan(&self, query: &DocumentQuery) -> Result<Vec<(sled::IVec, Value)>, CollectionError> {
        let mut matched = Vec::new();
        for entry in self.tree.iter() {
            let (key, bytes) = entry.map_err(CollectionError::from_sled("scan"))?;
            let document = Self::decode(&bytes)?;
            if query.matches(&document) {
                matched.push((key, document));
            }
        }
        Ok(matched)
    }

    /// Fills in a missing `_id` and returns the document's key.
    fn prepare_insert(document: &mut Value) -> Result<ObjectId, CollectionError> {
        let map = document.as_object_mut().ok_or_else(|| {
            CollectionError::InvalidOperation("inserted documents must be objects".to_string())
        })?;
        match map.get(ID_KEY) {
            Some(value) => ObjectId::from_value(value)
                .map_err(|e| CollectionError::InvalidOperation(format!("{ID_KEY}: {e}"))),
            None => {
                let id = ObjectId::new();
                map.insert(ID_KEY.to_string(), id.to_value());
                Ok(id)
            }
        }
    }

    fn apply_ops(
        tx: &sled::transaction::TransactionalTree,
        ops: &[WriteOp],
    ) -> Result<BulkWriteResult, ConflictableTransactionError<CollectionError>> {
        let mut result = BulkWriteResult::default();
        for op in ops {
            match op {
                WriteOp::InsertOne { document } => {
                    let mut document = document.clone();
                    let id = Self::prepare_insert(&mut document)
                        .map_err(ConflictableTransactionError::Abort)?;
                    if tx.get(id.bytes())?.is_some() {
                        return Err(ConflictableTransactionError::Abort(
                            CollectionError::DuplicateKey(id.to_hex()),
                        ));
                    }
                    let bytes = Self::encode(&document).map_err(ConflictableTransactionError::Abort)?;
                    tx.insert(&id.bytes()[..], bytes)?;
                    result.inserted_ids.push(id);
                }
                WriteOp::UpdateOne { filter, update } => {
                    let Some(bytes) = tx.get(filter.bytes())? else {
                        trace!("updateOne matched nothing for {filter}");
                        continue;
                    };
                    let mut document = Self::decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                    result.matched_count += 1;
                    if update.apply(&mut document).map_err(ConflictableTransactionError::Abort)? {
                        result.modified_count += 1;
                    }
                    let bytes = Self::encode(&document).map_err(ConflictableTransactionError::Abort)?;
                    tx.insert(&filter.bytes()[..], bytes)?;
                }
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl Collection for SledCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(
        &self,
        query: &DocumentQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>, CollectionError> {
        let documents = self
            .scan(query)?
            .into_iter()
            .map(|(_, mut document)| {
                projection.apply(&mut document);
                document
            })
            .collect::<Vec<_>>();
        trace!("find on {} returned {} documents", self.name, documents.len());
        Ok(documents)
    }

    /// All ops run in one transaction; the first failure aborts the batch.
    async fn bulk_write(&self, ops: Vec<WriteOp>) -> Result<BulkWriteResult, CollectionError> {
        if ops.is_empty() {
            return Ok(BulkWriteResult::default());
        }

        let result = self
            .tree
            .transaction(|tx| Self::apply_ops(tx, &ops))
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => CollectionError::Storage {
                    operation: "bulk_write".to_string(),
                    message: e.to_string(),
                },
            })?;

        self.tree
            .flush_async()
            .await
            .map_err(CollectionError::from_sled("flush"))?;

        debug!(
            "bulk_write on {}: {} ops, {} inserted, {} matched, {} modified",
            self.name,
            ops.len(),
            result.inserted_ids.len(),
            result.matched_count,
            result.modified_count
        );
        Ok(result)
    }

    async fn delete_one(&self, id: &ObjectId) -> Result<u64, CollectionError> {
        let removed = self
            .tree
            .remove(id.bytes())
            .map_err(CollectionError::from_sled("remove"))?;
        Ok(u64::from(removed.is_some()))
    }

    async fn delete_many(&self, query: &DocumentQuery) -> Result<u64, CollectionError> {
        let mut batch = sled::Batch::default();
        let mut removed = 0;
        for (key, _) in self.scan(query)? {
            batch.remove(key);
            removed += 1;
        }
        self.tree
            .apply_batch(batch)
            .map_err(CollectionError::from_sled("apply_batch"))?;
        debug!("delete_many on {} removed {} documents", self.name, removed);
        Ok(removed)
    }

    async fn count(&self, query: &DocumentQuery) -> Result<u64, CollectionError> {
        Ok(self.scan(query)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_operations::write_ops::UpdateOperator;
    use serde_json::json;

    fn collection() -> SledCollection {
        DbOperations::temporary().unwrap().collection("tasks").unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_finds() {
        let tasks = collection();
        let result = tasks
            .bulk_write(vec![
                WriteOp::insert(json!({"title": "a"})),
                WriteOp::insert(json!({"title": "b"})),
            ])
            .await
            .unwrap();
        assert_eq!(result.inserted_ids.len(), 2);

        let found = tasks
            .find_one(&DocumentQuery::by_id(&result.inserted_ids[1]), &Projection::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["title"], json!("b"));
        assert_eq!(found["_id"], result.inserted_ids[1].to_value());
        assert_eq!(tasks.count(&DocumentQuery::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_op_rolls_back_batch() {
        let tasks = collection();
        let id = tasks
            .bulk_write(vec![WriteOp::insert(json!({"title": "a", "tags": []}))])
            .await
            .unwrap()
            .inserted_ids[0];

        let err = tasks
            .bulk_write(vec![
                WriteOp::update(id, UpdateOperator::Set { path: "title".into(), value: json!("b") }),
                WriteOp::update(id, UpdateOperator::Push { path: "title".into(), value: json!("x") }),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::InvalidOperation(_)));

        let stored = tasks.find_one(&DocumentQuery::by_id(&id), &Projection::none()).await.unwrap().unwrap();
        assert_eq!(stored["title"], json!("a"));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let tasks = collection();
        let id = ObjectId::new();
        let doc = json!({"_id": id.to_value()});
        tasks.bulk_write(vec![WriteOp::insert(doc.clone())]).await.unwrap();
        let err = tasks.bulk_write(vec![WriteOp::insert(doc)]).await.unwrap_err();
        assert_eq!(err, CollectionError::DuplicateKey(id.to_hex()));
    }

    #[tokio::test]
    async fn test_deletes() {
        let tasks = collection();
        let ids = tasks
            .bulk_write(vec![
                WriteOp::insert(json!({"status": "open"})),
                WriteOp::insert(json!({"status": "open"})),
                WriteOp::insert(json!({"status": "done"})),
            ])
            .await
            .unwrap()
            .inserted_ids;

        assert_eq!(tasks.delete_one(&ids[2]).await.unwrap(), 1);
        assert_eq!(tasks.delete_one(&ids[2]).await.unwrap(), 0);
        let open = DocumentQuery::all().eq("status", json!("open"));
        assert_eq!(tasks.delete_many(&open).await.unwrap(), 2);
        assert_eq!(tasks.count(&DocumentQuery::all()).await.unwrap(), 0);
    }
}
