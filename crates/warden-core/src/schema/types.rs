use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rewrite::RewriteNode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("resource type '{0}' not defined in schema")]
    MissingType(String),

    #[error("relation '{relation}' not defined for resource type '{type_name}'")]
    MissingRelation { type_name: String, relation: String },

    #[error(
        "subject type '{subject_type}' not allowed in relation '{relation}' for resource type '{type_name}'"
    )]
    SubjectTypeNotAllowed {
        type_name: String,
        relation: String,
        subject_type: String,
    },

    #[error("permission '{permission}' not defined for resource type '{type_name}'")]
    MissingPermission {
        type_name: String,
        permission: String,
    },
}

/// An allowed subject type for a relation, optionally narrowed to a
/// sub-relation (`group#member`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectType {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl SubjectType {
    pub fn plain(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relation: None,
        }
    }

    pub fn with_relation(type_name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relation: Some(relation.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub subjects: Vec<SubjectType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userset_rewrite: Option<RewriteNode>,
}

impl Relation {
    pub fn new(subjects: Vec<SubjectType>) -> Self {
        Self {
            subjects,
            userset_rewrite: None,
        }
    }

    pub fn with_rewrite(mut self, rewrite: RewriteNode) -> Self {
        self.userset_rewrite = Some(rewrite);
        self
    }
}

/// A permission: a flat disjunction of relation names, e.g.
/// `"owner | editor | viewer"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub expression: String,
}

impl Permission {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Whether any relation in `held` satisfies the expression. Operands
    /// are `|`-separated and whitespace around them is ignored.
    pub fn granted_by(&self, held: &[String]) -> bool {
        self.expression
            .split('|')
            .map(str::trim)
            .filter(|operand| !operand.is_empty())
            .any(|operand| held.iter().any(|r| r == operand))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub relations: BTreeMap<String, Relation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub permissions: BTreeMap<String, Permission>,
}

/// The full schema: resource type name to definition. Serializes as that
/// map directly, which is the GET/PUT wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub definitions: BTreeMap<String, Definition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_definition(&self, type_name: &str) -> Result<&Definition, SchemaError> {
        self.definitions
            .get(type_name)
            .ok_or_else(|| SchemaError::MissingType(type_name.to_string()))
    }

    /// Admission check for a proposed tuple: the resource type exists, the
    /// relation is declared on it, and the subject's type is in the
    /// relation's allowed list.
    pub fn validate_relationship(
        &self,
        resource_type: &str,
        relation: &str,
        subject_type: &str,
    ) -> Result<(), SchemaError> {
        let def = self.get_definition(resource_type)?;
        let rel = def
            .relations
            .get(relation)
            .ok_or_else(|| SchemaError::MissingRelation {
                type_name: resource_type.to_string(),
                relation: relation.to_string(),
            })?;

        if rel.subjects.iter().any(|s| s.type_name == subject_type) {
            return Ok(());
        }

        Err(SchemaError::SubjectTypeNotAllowed {
            type_name: resource_type.to_string(),
            relation: relation.to_string(),
            subject_type: subject_type.to_string(),
        })
    }

    /// Whether any relation in `held` grants `permission` on the given
    /// resource type. Duplicate entries in `held` are harmless.
    pub fn evaluate_permission(
        &self,
        resource_type: &str,
        permission: &str,
        held: &[String],
    ) -> Result<bool, SchemaError> {
        let def = self.get_definition(resource_type)?;
        let perm =
            def.permissions
                .get(permission)
                .ok_or_else(|| SchemaError::MissingPermission {
                    type_name: resource_type.to_string(),
                    permission: permission.to_string(),
                })?;

        Ok(perm.granted_by(held))
    }

    /// The reference schema: users, nestable groups, folders, and
    /// documents whose viewer and editor relations carry rewrite rules
    /// (`viewer = this | editor | parent->viewer`, `editor = this | owner`).
    pub fn default_authz() -> Self {
        let mut definitions = BTreeMap::new();

        definitions.insert("user".to_string(), Definition::default());

        definitions.insert(
            "group".to_string(),
            Definition {
                relations: BTreeMap::from([(
                    "member".to_string(),
                    Relation::new(vec![SubjectType::plain("user"), SubjectType::plain("group")]),
                )]),
                permissions: BTreeMap::new(),
            },
        );

        let folder_relations = BTreeMap::from([
            (
                "owner".to_string(),
                Relation::new(vec![SubjectType::plain("user")]),
            ),
            (
                "editor".to_string(),
                Relation::new(vec![SubjectType::plain("user")]),
            ),
            (
                "viewer".to_string(),
                Relation::new(vec![
                    SubjectType::plain("user"),
                    SubjectType::with_relation("group", "member"),
                ]),
            ),
        ]);
        let document_permissions = BTreeMap::from([
            (
                "view".to_string(),
                Permission::new("owner | editor | viewer"),
            ),
            ("edit".to_string(), Permission::new("owner | editor")),
            ("delete".to_string(), Permission::new("owner")),
        ]);

        definitions.insert(
            "folder".to_string(),
            Definition {
                relations: folder_relations.clone(),
                permissions: document_permissions.clone(),
            },
        );

        let mut document_relations = folder_relations;
        document_relations.insert(
            "parent".to_string(),
            Relation::new(vec![SubjectType::plain("folder")]),
        );
        if let Some(viewer) = document_relations.get_mut("viewer") {
            viewer.userset_rewrite = Some(RewriteNode::union(vec![
                RewriteNode::this(),
                RewriteNode::computed_userset("editor"),
                RewriteNode::tuple_to_userset("parent", "viewer"),
            ]));
        }
        if let Some(editor) = document_relations.get_mut("editor") {
            editor.userset_rewrite = Some(RewriteNode::union(vec![
                RewriteNode::this(),
                RewriteNode::computed_userset("owner"),
            ]));
        }

        definitions.insert(
            "document".to_string(),
            Definition {
                relations: document_relations,
                permissions: document_permissions,
            },
        );

        Self { definitions }
    }
}
