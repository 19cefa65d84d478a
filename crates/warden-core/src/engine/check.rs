use std::collections::HashSet;

use crate::object::{ObjectRef, SubjectRef};
use crate::schema::{RewriteNode, Schema, SchemaError};
use crate::tuple::Relationship;

use super::{Decision, EngineConfig, EvalError};

/// Evaluates Check queries and userset rewrites over a borrowed snapshot of
/// the tuple set. The caller holds whatever lock protects the tuples for
/// the lifetime of the evaluator; nothing here re-acquires it.
pub struct Evaluator<'a> {
    tuples: &'a [Relationship],
    schema: &'a Schema,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(tuples: &'a [Relationship], schema: &'a Schema, config: &EngineConfig) -> Self {
        Self {
            tuples,
            schema,
            max_depth: config.max_depth,
        }
    }

    /// May `subject` perform `action` on `resource`?
    ///
    /// Collects the relations the subject effectively holds on the
    /// resource, then evaluates the action's permission expression over
    /// them.
    pub fn check(
        &self,
        subject: &SubjectRef,
        resource: &ObjectRef,
        action: &str,
    ) -> Result<Decision, EvalError> {
        let held = self.held_relations(resource, subject)?;
        let allowed =
            self.schema
                .evaluate_permission(&resource.object_type, action, &held)?;

        let reason = if allowed {
            format!("subject holds relation(s): {}", held.join(", "))
        } else {
            format!("subject holds no relation granting action '{action}'")
        };

        Ok(Decision { allowed, reason })
    }

    /// The relations `subject` effectively holds on `resource`: direct
    /// tuples, relations granted to a group the subject is a transitive
    /// member of, and relations whose rewrite rule evaluates true. The
    /// result may contain duplicates.
    pub fn held_relations(
        &self,
        resource: &ObjectRef,
        subject: &SubjectRef,
    ) -> Result<Vec<String>, EvalError> {
        let def = self.schema.get_definition(&resource.object_type)?;
        let mut held = Vec::new();

        for tuple in self.tuples {
            if tuple.resource == *resource && tuple.subject == *subject {
                held.push(tuple.relation.clone());
            }
        }

        for group in self.groups(subject) {
            let as_subject = SubjectRef::direct(&group.object_type, &group.object_id);
            for tuple in self.tuples {
                if tuple.resource == *resource && tuple.subject == as_subject {
                    held.push(tuple.relation.clone());
                }
            }
        }

        for (name, relation) in &def.relations {
            if relation.userset_rewrite.is_none() || held.iter().any(|h| h == name) {
                continue;
            }
            if self.evaluate_userset(resource, name, subject, 0)? {
                held.push(name.clone());
            }
        }

        Ok(held)
    }

    /// Is `subject` in the userset of `relation` on `object`?
    ///
    /// Without a rewrite rule this is the direct-tuple check plus group
    /// membership, restricted to the named relation. With one, the rule is
    /// interpreted.
    pub fn evaluate_userset(
        &self,
        object: &ObjectRef,
        relation: &str,
        subject: &SubjectRef,
        depth: usize,
    ) -> Result<bool, EvalError> {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded(self.max_depth));
        }

        let def = self.schema.get_definition(&object.object_type)?;
        let rel = def.relations.get(relation).ok_or_else(|| {
            EvalError::Schema(SchemaError::MissingRelation {
                type_name: object.object_type.clone(),
                relation: relation.to_string(),
            })
        })?;

        match &rel.userset_rewrite {
            None => Ok(self.direct_or_group_member(object, relation, subject)),
            Some(rewrite) => self.evaluate_rewrite(object, rewrite, subject, depth),
        }
    }

    fn direct_or_group_member(
        &self,
        object: &ObjectRef,
        relation: &str,
        subject: &SubjectRef,
    ) -> bool {
        if self
            .tuples
            .iter()
            .any(|t| t.matches(object, relation, subject))
        {
            return true;
        }

        self.groups(subject).iter().any(|group| {
            let as_subject = SubjectRef::direct(&group.object_type, &group.object_id);
            self.tuples
                .iter()
                .any(|t| t.matches(object, relation, &as_subject))
        })
    }

    fn evaluate_rewrite(
        &self,
        object: &ObjectRef,
        rewrite: &RewriteNode,
        subject: &SubjectRef,
        depth: usize,
    ) -> Result<bool, EvalError> {
        match rewrite {
            // Matches any relation on the object: the enclosing rule
            // already fixes the relation context.
            RewriteNode::This => Ok(self
                .tuples
                .iter()
                .any(|t| t.resource == *object && t.subject == *subject)),

            RewriteNode::ComputedUserset { relation } => {
                self.evaluate_userset(object, relation, subject, depth + 1)
            }

            RewriteNode::TupleToUserset {
                tupleset_relation,
                computed_relation,
            } => {
                for tuple in self.tuples {
                    if tuple.resource != *object || tuple.relation != *tupleset_relation {
                        continue;
                    }
                    let target = tuple.subject.object_part();
                    if self.evaluate_userset(&target, computed_relation, subject, depth + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            RewriteNode::Union(children) => {
                if children.is_empty() {
                    return Err(EvalError::InvalidRewrite("union has no children".into()));
                }
                for child in children {
                    if self.evaluate_rewrite(object, child, subject, depth)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            RewriteNode::Intersection(children) => {
                if children.is_empty() {
                    return Err(EvalError::InvalidRewrite(
                        "intersection has no children".into(),
                    ));
                }
                for child in children {
                    if !self.evaluate_rewrite(object, child, subject, depth)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            RewriteNode::Exclusion { base, subtract } => {
                if !self.evaluate_rewrite(object, base, subject, depth)? {
                    return Ok(false);
                }
                Ok(!self.evaluate_rewrite(object, subtract, subject, depth)?)
            }
        }
    }

    /// All groups `subject` is a transitive member of, following
    /// `(group:*, member, _)` edges. Safe on cyclic membership data: the
    /// visited set makes re-entering a group a no-op.
    pub fn groups(&self, subject: &SubjectRef) -> HashSet<ObjectRef> {
        let mut found = HashSet::new();
        let mut stack = vec![subject.clone()];

        while let Some(current) = stack.pop() {
            for tuple in self.tuples {
                if tuple.resource.object_type == "group"
                    && tuple.relation == "member"
                    && tuple.subject == current
                    && found.insert(tuple.resource.clone())
                {
                    stack.push(SubjectRef::direct(
                        &tuple.resource.object_type,
                        &tuple.resource.object_id,
                    ));
                }
            }
        }

        found
    }
}
