use crate::db_operations::{Collection, UpdateOperator, WriteOp};
use crate::error::{ButtressError, ButtressResult};
use crate::schema::populator::populate_document;
use crate::schema::types::ObjectId;
use crate::update::path_context::UpdateType;
use crate::update::validation::ValidatedUpdate;
use log::{debug, info};
use serde::Serialize;
use serde_json::{json, Value};

/// What one executed update did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResult {
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    pub path: String,
    pub value: Value,
}

/// Write operations for one update, plus the result reported for it.
fn plan(id: ObjectId, update: ValidatedUpdate) -> (Vec<WriteOp>, UpdateResult) {
    let ValidatedUpdate {
        path,
        value,
        update_type,
        element_schema,
    } = update;

    let value = match &element_schema {
        Some(schema) => populate_document(schema, &value),
        None => value,
    };

    match update_type {
        UpdateType::Scalar => (
            vec![WriteOp::update(id, UpdateOperator::Set { path: path.clone(), value: value.clone() })],
            UpdateResult { update_type, path, value },
        ),
        UpdateType::VectorAdd => (
            vec![WriteOp::update(id, UpdateOperator::Push { path: path.clone(), value: value.clone() })],
            UpdateResult { update_type, path, value },
        ),
        UpdateType::VectorRm => {
            // "<parent>.<index>.__remove__": blank the element, then pull the blank.
            let element = path.rsplit_once('.').map_or(path.as_str(), |(element, _)| element);
            let (parent, index) = element.rsplit_once('.').unwrap_or(("", element));
            let index = index
                .parse::<u64>()
                .map_or_else(|_| Value::String(index.to_string()), Value::from);
            let ops = vec![
                WriteOp::update(id, UpdateOperator::Unset { path: element.to_string() }),
                WriteOp::update(id, UpdateOperator::Pull { path: parent.to_string(), value: Value::Null }),
            ];
            let result = UpdateResult {
                update_type,
                path: parent.to_string(),
                value: json!({"numRemoved": 1, "index": index}),
            };
            (ops, result)
        }
    }
}

/// Runs one validated update as a single bulk write.
pub async fn execute_update(
    collection: &dyn Collection,
    id: ObjectId,
    update: ValidatedUpdate,
) -> ButtressResult<UpdateResult> {
    let (ops, result) = plan(id, update);
    debug!("{} {} on {} ({} ops)", result.update_type, result.path, id, ops.len());
    collection
        .bulk_write(ops)
        .await
        .map_err(|e| ButtressError::UpdateExecution(e.to_string()))?;
    Ok(result)
}

/// Runs validated updates strictly one after another against one document.
pub async fn execute_updates(
    collection: &dyn Collection,
    id: ObjectId,
    updates: Vec<ValidatedUpdate>,
) -> ButtressResult<Vec<UpdateResult>> {
    let mut results = Vec::with_capacity(updates.len());
    for update in updates {
        results.push(execute_update(collection, id, update).await?);
    }
    info!("Applied {} updates to {} in {}", results.len(), id, collection.name());
    Ok(results)
}
