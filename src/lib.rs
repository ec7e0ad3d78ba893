//! # Buttress Schema Engine
//!
//! This library implements the schema engine behind the Buttress realtime
//! datastore. Every resource collection is described by an application-defined
//! [`SchemaDescription`]; the engine uses that description to validate and
//! sanitise request bodies, to apply partial updates addressed by dotted paths,
//! and to strip fields and rows a caller's role is not allowed to read.
//!
//! ## Core Components
//!
//! * `schema` - Schema descriptions, flattening, type coercion, validation and population
//! * `update` - Update-path contexts, per-path validation and bulk-write execution
//! * `permissions` - Role-based projection of query results
//! * `db_operations` - Collection trait, write operations and the sled-backed store
//! * `model` - Per-collection resource model wrapping the engine
//! * `logging` - Logging configuration and subscriber setup
//! * `config` - Node configuration loading
//!
//! ## Architecture
//!
//! The engine is stateless: schemas are compiled (flattened) up front and
//! passed explicitly into every call together with the caller's token and the
//! application roles. Only the update executor talks to storage, and it does so
//! through the injected [`Collection`] handle.

pub mod config;
pub mod db_operations;
pub mod error;
pub mod logging;
pub mod model;
pub mod permissions;
pub mod schema;
pub mod testing;
pub mod update;

// Re-export main types for convenience
pub use config::{load_node_config, NodeConfig};
pub use db_operations::{Collection, DbOperations, SledCollection};
pub use error::{ButtressError, ButtressResult};
pub use model::SchemaModel;
pub use permissions::{prepare_schema_result, AppRole, Token};
pub use schema::types::{FieldConfig, FieldType, ObjectId, SchemaDescription, SchemaError};
pub use schema::{apply_app_properties, validate, SchemaRegistry, ValidationResult};
pub use update::{update_by_path, validate_update, PathContext, UpdateRequest, UpdateValidation};
