// permissions module: role-based projection of query results

pub mod permission_manager;
pub mod permission_wrapper;
pub mod types;

pub use permission_manager::PermissionManager;
pub use permission_wrapper::prepare_schema_result;
pub use types::policy::{AppRole, Token, ALLOW_ALL};
