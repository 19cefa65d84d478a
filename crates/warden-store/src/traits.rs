use warden_core::engine::{Decision, EvalError};
use warden_core::object::{MalformedRef, SubjectRef};
use warden_core::schema::SchemaError;
use warden_core::tuple::{Relationship, Zookie};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    MalformedRef(#[from] MalformedRef),

    #[error("schema rejected relationship: {0}")]
    Schema(#[from] SchemaError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error("relationship not found")]
    NotFound,
}

/// The result of an `add`: the tuple's zookie, and whether the call
/// actually created it (`false` on an idempotent duplicate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub zookie: Zookie,
    pub created: bool,
}

/// The store contract. Identifiers cross this boundary in their string
/// form (`<type>:<id>`, subjects optionally `<type>:<id>#<relation>`);
/// parsing and schema admission happen inside. A durable backend would
/// implement this same contract over its database.
pub trait TupleStore: Send + Sync {
    /// Insert a tuple after schema validation. Re-adding an identical
    /// triple is idempotent and returns the original zookie.
    fn add(&self, resource: &str, relation: &str, subject: &str)
    -> Result<WriteOutcome, StoreError>;

    /// Remove a tuple. `StoreError::NotFound` when no such triple exists.
    fn remove(&self, resource: &str, relation: &str, subject: &str) -> Result<(), StoreError>;

    /// May `subject` perform `action` on `resource`?
    fn check(&self, subject: &str, resource: &str, action: &str) -> Result<Decision, StoreError>;

    /// The flattened set of subjects holding `relation` on `resource`.
    fn expand(&self, resource: &str, relation: &str) -> Result<Vec<SubjectRef>, StoreError>;

    /// A copy of the current tuple set. Mutating the copy does not affect
    /// the store.
    fn list(&self) -> Vec<Relationship>;

    /// The latest minted token, for read-at-least consistency checks.
    fn current_token(&self) -> Zookie;
}
