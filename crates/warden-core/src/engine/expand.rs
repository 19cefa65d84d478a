use std::collections::HashSet;

use crate::object::{ObjectRef, SubjectRef};
use crate::tuple::Relationship;

/// All subjects holding `relation` on `resource`: the directly related
/// subjects, plus the transitive members of any `group:`-type subject
/// among them. Rewrite rules are not consulted; this reflects the raw
/// tuple topology. Order is unspecified; the result is deduplicated.
pub fn expand(tuples: &[Relationship], resource: &ObjectRef, relation: &str) -> Vec<SubjectRef> {
    let mut seen = HashSet::new();
    let mut subjects = Vec::new();
    let mut visited_groups = HashSet::new();

    for tuple in tuples {
        if tuple.resource != *resource || tuple.relation != relation {
            continue;
        }
        if seen.insert(tuple.subject.clone()) {
            subjects.push(tuple.subject.clone());
        }
        if tuple.subject.subject_type == "group" {
            expand_group_members(
                tuples,
                &tuple.subject.object_part(),
                &mut seen,
                &mut subjects,
                &mut visited_groups,
            );
        }
    }

    subjects
}

/// Depth-first flattening of a group's membership. `visited` keys the
/// traversal by group, so cyclic membership data terminates.
fn expand_group_members(
    tuples: &[Relationship],
    group: &ObjectRef,
    seen: &mut HashSet<SubjectRef>,
    subjects: &mut Vec<SubjectRef>,
    visited: &mut HashSet<ObjectRef>,
) {
    if !visited.insert(group.clone()) {
        return;
    }

    for tuple in tuples {
        if tuple.resource != *group || tuple.relation != "member" {
            continue;
        }
        if seen.insert(tuple.subject.clone()) {
            subjects.push(tuple.subject.clone());
        }
        if tuple.subject.subject_type == "group" {
            expand_group_members(tuples, &tuple.subject.object_part(), seen, subjects, visited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::Zookie;

    fn tuple(resource: &str, relation: &str, subject: &str) -> Relationship {
        Relationship {
            resource: resource.parse().unwrap(),
            relation: relation.to_string(),
            subject: subject.parse().unwrap(),
            zookie: Zookie::new(0),
            updated_at: chrono::Utc::now(),
        }
    }

    fn subject_strings(subjects: Vec<SubjectRef>) -> Vec<String> {
        let mut out: Vec<String> = subjects.iter().map(SubjectRef::to_string).collect();
        out.sort();
        out
    }

    #[test]
    fn expand_returns_direct_subjects() {
        let tuples = vec![
            tuple("document:report", "viewer", "user:alice"),
            tuple("document:report", "viewer", "user:bob"),
            tuple("document:report", "editor", "user:carol"),
        ];

        let subjects = expand(&tuples, &"document:report".parse().unwrap(), "viewer");

        assert_eq!(
            subject_strings(subjects),
            vec!["user:alice".to_string(), "user:bob".to_string()]
        );
    }

    #[test]
    fn expand_flattens_group_members() {
        let tuples = vec![
            tuple("document:report", "viewer", "group:eng"),
            tuple("group:eng", "member", "user:charlie"),
            tuple("group:eng", "member", "user:dana"),
        ];

        let subjects = expand(&tuples, &"document:report".parse().unwrap(), "viewer");

        assert_eq!(
            subject_strings(subjects),
            vec![
                "group:eng".to_string(),
                "user:charlie".to_string(),
                "user:dana".to_string(),
            ]
        );
    }

    #[test]
    fn expand_follows_nested_groups() {
        let tuples = vec![
            tuple("document:report", "viewer", "group:eng"),
            tuple("group:eng", "member", "group:fe"),
            tuple("group:fe", "member", "user:dave"),
        ];

        let subjects = expand(&tuples, &"document:report".parse().unwrap(), "viewer");

        assert_eq!(
            subject_strings(subjects),
            vec![
                "group:eng".to_string(),
                "group:fe".to_string(),
                "user:dave".to_string(),
            ]
        );
    }

    #[test]
    fn expand_terminates_on_cyclic_groups() {
        let tuples = vec![
            tuple("document:report", "viewer", "group:a"),
            tuple("group:a", "member", "group:b"),
            tuple("group:b", "member", "group:a"),
            tuple("group:b", "member", "user:zoe"),
        ];

        let subjects = expand(&tuples, &"document:report".parse().unwrap(), "viewer");

        assert_eq!(
            subject_strings(subjects),
            vec![
                "group:a".to_string(),
                "group:b".to_string(),
                "user:zoe".to_string(),
            ]
        );
    }

    #[test]
    fn expand_deduplicates_members_reachable_twice() {
        let tuples = vec![
            tuple("document:report", "viewer", "group:a"),
            tuple("document:report", "viewer", "group:b"),
            tuple("group:a", "member", "user:zoe"),
            tuple("group:b", "member", "user:zoe"),
        ];

        let subjects = expand(&tuples, &"document:report".parse().unwrap(), "viewer");

        let zoes = subjects
            .iter()
            .filter(|s| s.to_string() == "user:zoe")
            .count();
        assert_eq!(zoes, 1);
    }

    #[test]
    fn expand_unknown_relation_is_empty() {
        let tuples = vec![tuple("document:report", "viewer", "user:alice")];

        let subjects = expand(&tuples, &"document:report".parse().unwrap(), "auditor");

        assert!(subjects.is_empty());
    }
}
