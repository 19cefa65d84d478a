use std::sync::RwLock;

use chrono::Utc;

use warden_core::engine::{self, Decision, EngineConfig, Evaluator};
use warden_core::object::{ObjectRef, SubjectRef};
use warden_core::schema::SharedSchema;
use warden_core::tuple::{Relationship, Zookie};

use crate::traits::{StoreError, TupleStore, WriteOutcome};

#[derive(Debug)]
struct Inner {
    tuples: Vec<Relationship>,
    change_counter: u64,
}

/// In-memory tuple store.
///
/// One reader/writer lock guards the tuple set and the change counter
/// together: mutators hold the write lock for the whole operation, and
/// `check`/`expand`/`list`/`current_token` evaluate against the tuple
/// slice under a single read lock, so every operation sees a consistent
/// snapshot and the evaluator never re-enters the lock.
pub struct MemoryTupleStore {
    schema: SharedSchema,
    engine_config: EngineConfig,
    inner: RwLock<Inner>,
}

impl MemoryTupleStore {
    pub fn new(schema: SharedSchema) -> Self {
        Self::with_engine_config(schema, EngineConfig::default())
    }

    pub fn with_engine_config(schema: SharedSchema, engine_config: EngineConfig) -> Self {
        Self {
            schema,
            engine_config,
            inner: RwLock::new(Inner {
                tuples: Vec::new(),
                change_counter: 0,
            }),
        }
    }

    pub fn schema(&self) -> &SharedSchema {
        &self.schema
    }
}

impl TupleStore for MemoryTupleStore {
    fn add(
        &self,
        resource: &str,
        relation: &str,
        subject: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let resource: ObjectRef = resource.parse()?;
        let subject: SubjectRef = subject.parse()?;

        let schema = self.schema.load();
        schema.validate_relationship(&resource.object_type, relation, &subject.subject_type)?;

        let mut inner = self.inner.write().unwrap();

        if let Some(existing) = inner
            .tuples
            .iter()
            .find(|t| t.matches(&resource, relation, &subject))
        {
            return Ok(WriteOutcome {
                zookie: existing.zookie,
                created: false,
            });
        }

        inner.change_counter += 1;
        let zookie = Zookie::new(inner.change_counter);
        inner.tuples.push(Relationship {
            resource,
            relation: relation.to_string(),
            subject,
            zookie,
            updated_at: Utc::now(),
        });

        Ok(WriteOutcome {
            zookie,
            created: true,
        })
    }

    fn remove(&self, resource: &str, relation: &str, subject: &str) -> Result<(), StoreError> {
        let resource: ObjectRef = resource.parse()?;
        let subject: SubjectRef = subject.parse()?;

        let mut inner = self.inner.write().unwrap();

        let position = inner
            .tuples
            .iter()
            .position(|t| t.matches(&resource, relation, &subject))
            .ok_or(StoreError::NotFound)?;

        inner.tuples.swap_remove(position);
        inner.change_counter += 1;
        Ok(())
    }

    fn check(&self, subject: &str, resource: &str, action: &str) -> Result<Decision, StoreError> {
        let subject: SubjectRef = subject.parse()?;
        let resource: ObjectRef = resource.parse()?;

        let schema = self.schema.load();
        let inner = self.inner.read().unwrap();
        let evaluator = Evaluator::new(&inner.tuples, &schema, &self.engine_config);

        Ok(evaluator.check(&subject, &resource, action)?)
    }

    fn expand(&self, resource: &str, relation: &str) -> Result<Vec<SubjectRef>, StoreError> {
        let resource: ObjectRef = resource.parse()?;

        let inner = self.inner.read().unwrap();
        Ok(engine::expand(&inner.tuples, &resource, relation))
    }

    fn list(&self) -> Vec<Relationship> {
        self.inner.read().unwrap().tuples.clone()
    }

    fn current_token(&self) -> Zookie {
        Zookie::new(self.inner.read().unwrap().change_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::schema::Schema;

    fn store() -> MemoryTupleStore {
        MemoryTupleStore::new(SharedSchema::new(Schema::default_authz()))
    }

    // 1. Fresh store mints no tokens
    #[test]
    fn fresh_store_token_is_zero() {
        assert_eq!(store().current_token(), Zookie::new(0));
    }

    // 2. Add returns incrementing tokens
    #[test]
    fn add_mints_strictly_increasing_tokens() {
        let store = store();

        let t1 = store
            .add("document:report", "owner", "user:alice")
            .unwrap();
        let t2 = store.add("document:report", "editor", "user:bob").unwrap();
        let t3 = store
            .add("document:report", "viewer", "user:carol")
            .unwrap();

        assert!(t1.zookie < t2.zookie);
        assert!(t2.zookie < t3.zookie);
        assert_eq!(t1.zookie.to_string(), "zk_1");
        assert_eq!(store.current_token(), t3.zookie);
    }

    // 3. Idempotent re-add returns the original token
    #[test]
    fn duplicate_add_is_idempotent() {
        let store = store();

        let first = store
            .add("document:report", "owner", "user:alice")
            .unwrap();
        let second = store
            .add("document:report", "owner", "user:alice")
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.zookie, second.zookie);
        assert_eq!(store.current_token(), first.zookie);
        assert_eq!(store.list().len(), 1);
    }

    // 4. Add then check allows through a permission naming the relation
    #[test]
    fn add_then_check_allows() {
        let store = store();
        store
            .add("document:report", "owner", "user:alice")
            .unwrap();

        let decision = store
            .check("user:alice", "document:report", "view")
            .unwrap();

        assert!(decision.allowed);
    }

    // 5. Remove flips the decision and advances the counter
    #[test]
    fn remove_revokes_access() {
        let store = store();
        store
            .add("document:report", "viewer", "user:alice")
            .unwrap();
        let before = store.current_token();

        store
            .remove("document:report", "viewer", "user:alice")
            .unwrap();

        assert!(store.current_token() > before);
        assert!(
            !store
                .check("user:alice", "document:report", "view")
                .unwrap()
                .allowed
        );
    }

    // 6. Second remove of the same triple is NotFound
    #[test]
    fn double_remove_is_not_found() {
        let store = store();
        store
            .add("document:report", "viewer", "user:alice")
            .unwrap();
        store
            .remove("document:report", "viewer", "user:alice")
            .unwrap();

        let err = store
            .remove("document:report", "viewer", "user:alice")
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound);
    }

    // 7. Remove keeps other grants intact
    #[test]
    fn remove_leaves_other_paths_untouched() {
        let store = store();
        store
            .add("document:report", "viewer", "user:alice")
            .unwrap();
        store
            .add("document:report", "owner", "user:alice")
            .unwrap();

        store
            .remove("document:report", "viewer", "user:alice")
            .unwrap();

        assert!(
            store
                .check("user:alice", "document:report", "view")
                .unwrap()
                .allowed
        );
    }

    // 8. Failed operations leave the counter alone
    #[test]
    fn failed_operations_do_not_advance_the_counter() {
        let store = store();
        store
            .add("document:report", "owner", "user:alice")
            .unwrap();
        let token = store.current_token();

        let _ = store.add("spaceship:x", "owner", "user:alice").unwrap_err();
        let _ = store
            .remove("document:report", "viewer", "user:ghost")
            .unwrap_err();

        assert_eq!(store.current_token(), token);
    }

    #[test]
    fn add_rejects_malformed_resource() {
        let err = store().add("report", "owner", "user:alice").unwrap_err();

        assert!(matches!(err, StoreError::MalformedRef(_)));
    }

    #[test]
    fn add_rejects_malformed_subject() {
        let err = store()
            .add("document:report", "owner", "alice")
            .unwrap_err();

        assert!(matches!(err, StoreError::MalformedRef(_)));
    }

    #[test]
    fn add_rejects_unknown_resource_type() {
        let store = store();

        let err = store.add("spaceship:x", "owner", "user:alice").unwrap_err();

        assert!(matches!(err, StoreError::Schema(_)));
        assert!(store.list().is_empty());
    }

    #[test]
    fn add_rejects_undeclared_relation() {
        let err = store()
            .add("document:report", "auditor", "user:alice")
            .unwrap_err();

        assert!(matches!(err, StoreError::Schema(_)));
    }

    #[test]
    fn add_rejects_disallowed_subject_type() {
        let err = store()
            .add("document:report", "owner", "folder:projects")
            .unwrap_err();

        assert!(matches!(err, StoreError::Schema(_)));
    }

    #[test]
    fn check_rejects_malformed_ids() {
        let err = store().check("alice", "document:report", "view").unwrap_err();

        assert!(matches!(err, StoreError::MalformedRef(_)));
    }

    #[test]
    fn list_returns_a_snapshot_copy() {
        let store = store();
        store
            .add("document:report", "owner", "user:alice")
            .unwrap();

        let mut listed = store.list();
        listed.clear();

        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn list_carries_zookie_and_timestamp() {
        let store = store();
        let outcome = store
            .add("document:report", "owner", "user:alice")
            .unwrap();

        let listed = store.list();

        assert_eq!(listed[0].zookie, outcome.zookie);
        assert!(listed[0].updated_at <= Utc::now());
    }

    #[test]
    fn expand_flattens_groups_through_the_store() {
        let store = store();
        store
            .add("document:report", "viewer", "group:eng")
            .unwrap();
        store.add("group:eng", "member", "user:charlie").unwrap();

        let subjects = store.expand("document:report", "viewer").unwrap();

        let rendered: Vec<String> = subjects.iter().map(SubjectRef::to_string).collect();
        assert!(rendered.contains(&"group:eng".to_string()));
        assert!(rendered.contains(&"user:charlie".to_string()));
    }

    #[test]
    fn schema_replacement_applies_to_subsequent_adds() {
        let store = store();
        store
            .add("document:report", "owner", "user:alice")
            .unwrap();

        store.schema().replace(Schema::new());

        let err = store
            .add("document:report", "owner", "user:bob")
            .unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
        // Tuples admitted under the old schema remain stored.
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn concurrent_adds_mint_unique_tokens() {
        use std::sync::Arc;

        let store = Arc::new(store());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let mut zookies = Vec::new();
                for j in 0..25 {
                    let outcome = store
                        .add(
                            &format!("document:doc-{i}-{j}"),
                            "viewer",
                            &format!("user:u{i}"),
                        )
                        .unwrap();
                    zookies.push(outcome.zookie);
                }
                zookies
            }));
        }

        let mut all: Vec<Zookie> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();

        assert_eq!(all.len(), 200);
        assert_eq!(store.current_token(), Zookie::new(200));
    }

    #[test]
    fn readers_see_consistent_snapshots_under_writes() {
        use std::sync::Arc;

        let store = Arc::new(store());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..100 {
                    store
                        .add(&format!("document:d{i}"), "viewer", "user:alice")
                        .unwrap();
                }
            })
        };

        for _ in 0..100 {
            let listed = store.list();
            // Every observed tuple is fully formed.
            for tuple in &listed {
                assert_eq!(tuple.relation, "viewer");
                assert!(tuple.zookie.value() > 0);
            }
        }

        writer.join().unwrap();
        assert_eq!(store.list().len(), 100);
    }
}
