pub mod engine;
pub mod object;
pub mod schema;
pub mod tuple;

pub use engine::{Decision, EngineConfig, EvalError, Evaluator};
pub use object::{MalformedRef, ObjectRef, SubjectRef};
pub use schema::{Schema, SchemaError, SharedSchema};
pub use tuple::{Relationship, Zookie};
