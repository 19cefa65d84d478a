mod check;
mod expand;

pub use check::Evaluator;
pub use expand::expand;

use crate::schema::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid rewrite rule: {0}")]
    InvalidRewrite(String),

    #[error("rewrite evaluation exceeded max depth {0}")]
    DepthExceeded(usize),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on recursion through computed-userset and tuple-to-userset
    /// hops. Group expansion is bounded by its visited set instead.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth: 16 }
    }
}

/// The outcome of a Check, with a human-readable reason. Reasons are
/// diagnostic only and are not meant to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
}
