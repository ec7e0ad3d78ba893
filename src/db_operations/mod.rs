// Storage collaborator: collection trait, write operations and the sled backend
pub mod collection;
pub mod core;
pub mod error;
pub mod query;
pub mod write_ops;

// Re-export the main DbOperations struct and the collection API
pub use self::core::{DbOperations, SledCollection};
pub use collection::{add, AddOutcome, Collection, METADATA_KEY};
pub use error::CollectionError;
pub use query::{get_path, Condition, DocumentQuery, Projection};
pub use write_ops::{BulkWriteResult, UpdateOperator, WriteOp};
