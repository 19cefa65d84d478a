mod rewrite;
mod shared;
mod types;

pub use rewrite::RewriteNode;
pub use shared::SharedSchema;
pub use types::{Definition, Permission, Relation, Schema, SchemaError, SubjectType};
