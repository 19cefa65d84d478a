use warden_store::{StoreError, TupleStore};

/// Seed the reference tuples used by demos and smoke tests: alice owns the
/// report, bob edits it, engineering can view it, and frontend nests into
/// engineering.
pub fn seed_sample_data(store: &impl TupleStore) -> Result<(), StoreError> {
    const TUPLES: &[(&str, &str, &str)] = &[
        ("document:report", "owner", "user:alice"),
        ("document:report", "editor", "user:bob"),
        ("document:report", "viewer", "group:engineering"),
        ("group:engineering", "member", "user:charlie"),
        ("group:frontend", "member", "user:dave"),
        ("group:engineering", "member", "group:frontend"),
    ];

    for (resource, relation, subject) in TUPLES {
        store.add(resource, relation, subject)?;
    }
    Ok(())
}
