pub mod date;
pub mod description;
pub mod errors;
pub mod field;
pub mod flattened;
pub mod object_id;

pub use description::{RoleDisposition, SchemaDescription, SchemaRole, TIMESTAMPS_EXTENSION};
pub use errors::SchemaError;
pub use field::{Disposition, FieldConfig, FieldPermission, FieldType};
pub use flattened::{BodyEntry, FlattenedBody, FlattenedSchema};
pub use object_id::{IdError, ObjectId};
