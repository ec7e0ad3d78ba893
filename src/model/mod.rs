//! Per-collection resource model.
//!
//! A [`SchemaModel`] binds one compiled schema to its storage collection and
//! exposes the create/read/update/delete operations routes are built on.

use crate::db_operations::{
    add, AddOutcome, Collection, DbOperations, DocumentQuery, Projection, METADATA_KEY,
};
use crate::error::{ButtressError, ButtressResult};
use crate::permissions::{prepare_schema_result, AppRole, Token};
use crate::schema::populator::populate_document;
use crate::schema::registry::CompiledSchema;
use crate::schema::types::date::now_value;
use crate::schema::types::{ObjectId, SchemaDescription};
use crate::schema::validator::{validate_body, ValidationResult};
use crate::update::{
    check_updates, execute_updates, validate_requests, PathContext, UpdateRequest, UpdateResult,
    UpdateValidation, ValidatedUpdate,
};
use log::{debug, info, trace};
use serde_json::{Map, Value};
use std::sync::Arc;

const ID_KEY: &str = "_id";
const BODY_ID_KEY: &str = "id";
const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

pub struct SchemaModel {
    schema: Arc<CompiledSchema>,
    collection: Arc<dyn Collection>,
    path_context: PathContext,
}

impl SchemaModel {
    /// Opens the model's collection in `db`, named `<app>-<collection>`
    /// when an app short id is given.
    pub fn new(
        db: &DbOperations,
        schema: Arc<CompiledSchema>,
        app_short_id: Option<&str>,
    ) -> ButtressResult<Self> {
        let name = Self::collection_name(&schema.description, app_short_id);
        let collection = db.collection(&name)?;
        info!("Model for schema '{}' bound to collection {}", schema.name(), name);
        Ok(Self::with_collection(schema, Arc::new(collection)))
    }

    /// Binds a schema to an existing collection handle.
    pub fn with_collection(schema: Arc<CompiledSchema>, collection: Arc<dyn Collection>) -> Self {
        let path_context = schema.path_context.clone();
        Self {
            schema,
            collection,
            path_context,
        }
    }

    /// Layers caller-supplied update paths over the schema's own.
    pub fn with_base_context(mut self, base: &PathContext) -> ButtressResult<Self> {
        self.path_context = self.schema.path_context_with(base)?;
        Ok(self)
    }

    #[must_use]
    pub fn collection_name(schema: &SchemaDescription, app_short_id: Option<&str>) -> String {
        match app_short_id {
            Some(app) if !app.is_empty() => format!("{app}-{}", schema.collection),
            _ => schema.collection.clone(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaDescription {
        &self.schema.description
    }

    #[must_use]
    pub fn collection(&self) -> &dyn Collection {
        self.collection.as_ref()
    }

    /// Validates one body or each of an array of bodies.
    #[must_use]
    pub fn validate(&self, body: &Value) -> ValidationResult {
        validate_body(&self.schema.flattened, body)
    }

    /// The document stored for one body item: its application properties,
    /// overlaid with `internals`, the id given as `body.id` and the creation
    /// timestamps.
    pub fn create_document(&self, item: &Value, internals: &Map<String, Value>) -> ButtressResult<Value> {
        let mut entity = internals.clone();

        if let Some(id) = item.get(BODY_ID_KEY).filter(|id| !id.is_null()) {
            entity.insert(ID_KEY.to_string(), ObjectId::from_value(id)?.to_value());
        }
        if self.schema.description.has_timestamps() {
            entity.insert(CREATED_AT.to_string(), now_value());
            entity.insert(UPDATED_AT.to_string(), Value::Null);
        }

        let mut document = match populate_document(&self.schema.flattened, item) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        document.extend(entity);
        Ok(Value::Object(document))
    }

    /// Inserts one body or an array of bodies.
    pub async fn add(&self, body: &Value, internals: &Map<String, Value>) -> ButtressResult<AddOutcome> {
        add(self.collection.as_ref(), body, |item| self.create_document(item, internals)).await
    }

    #[must_use]
    pub fn validate_update(&self, body: &Value) -> UpdateValidation {
        validate_requests(&self.path_context, &self.schema.flattened, &UpdateRequest::from_body(body))
    }

    /// Validates then applies path updates to document `id`. Collections
    /// with timestamps also get `updatedAt` set.
    pub async fn update_by_path(&self, body: &Value, id: ObjectId) -> ButtressResult<Vec<UpdateResult>> {
        let mut updates = check_updates(
            &self.path_context,
            &self.schema.flattened,
            &UpdateRequest::from_body(body),
        )
        .map_err(ButtressError::UpdatePath)?;

        if self.schema.description.has_timestamps() {
            updates.push(ValidatedUpdate::scalar(UPDATED_AT, now_value()));
        }
        execute_updates(self.collection.as_ref(), id, updates).await
    }

    pub async fn exists(&self, id: ObjectId) -> ButtressResult<bool> {
        trace!("exists: {} {}", self.collection.name(), id);
        Ok(self.collection.count(&DocumentQuery::by_id(&id)).await? > 0)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> ButtressResult<Option<Value>> {
        trace!("find_by_id: {} {}", self.collection.name(), id);
        let projection = Projection::none().exclude(METADATA_KEY);
        Ok(self
            .collection
            .find_one(&DocumentQuery::by_id(&id), &projection)
            .await?)
    }

    pub async fn find(&self, query: &DocumentQuery, projection: &Projection) -> ButtressResult<Vec<Value>> {
        Ok(self.collection.find(query, projection).await?)
    }

    pub async fn find_one(
        &self,
        query: &DocumentQuery,
        projection: &Projection,
    ) -> ButtressResult<Option<Value>> {
        Ok(self.collection.find_one(query, projection).await?)
    }

    pub async fn find_all(&self) -> ButtressResult<Vec<Value>> {
        self.find(&DocumentQuery::all(), &Projection::none()).await
    }

    pub async fn find_all_by_id(&self, ids: &[ObjectId]) -> ButtressResult<Vec<Value>> {
        let projection = Projection::none().exclude(METADATA_KEY);
        self.find(&DocumentQuery::by_ids(ids), &projection).await
    }

    /// Deletes document `id`; a missing document is [`ButtressError::NotFound`].
    pub async fn rm(&self, id: ObjectId) -> ButtressResult<()> {
        debug!("DELETING: {} {}", self.collection.name(), id);
        match self.collection.delete_one(&id).await? {
            0 => Err(ButtressError::NotFound(id.to_hex())),
            _ => Ok(()),
        }
    }

    pub async fn rm_bulk(&self, ids: &[ObjectId]) -> ButtressResult<u64> {
        self.rm_all(&DocumentQuery::by_ids(ids)).await
    }

    pub async fn rm_all(&self, query: &DocumentQuery) -> ButtressResult<u64> {
        let removed = self.collection.delete_many(query).await?;
        debug!("rm_all: {} removed {}", self.collection.name(), removed);
        Ok(removed)
    }

    /// Projects a query result for `token` with this model's schema.
    pub fn prepare_result(
        &self,
        result: Value,
        app_roles: &[AppRole],
        token: Option<&Token>,
    ) -> ButtressResult<Value> {
        prepare_schema_result(result, app_roles, Some(&self.schema.description), token)
    }
}
