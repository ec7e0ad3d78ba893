/// Problems with a schema description itself, as opposed to problems with
/// the data validated against it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema not found: {0}")]
    NotFound(String),
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),
    #[error("Invalid path pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Duplicate schema: {0}")]
    Duplicate(String),
}
