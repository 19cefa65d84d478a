use std::sync::{Arc, RwLock};

use super::types::Schema;

/// A cloneable handle to the live schema.
///
/// Readers take a point-in-time `Arc<Schema>`; replacement swaps the whole
/// schema at once. Evaluations in flight keep using whichever pointer they
/// loaded on entry.
#[derive(Debug, Clone)]
pub struct SharedSchema {
    inner: Arc<RwLock<Arc<Schema>>>,
}

impl SharedSchema {
    pub fn new(schema: Schema) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(schema))),
        }
    }

    pub fn load(&self) -> Arc<Schema> {
        Arc::clone(&self.inner.read().unwrap())
    }

    pub fn replace(&self, schema: Schema) {
        *self.inner.write().unwrap() = Arc::new(schema);
    }
}
