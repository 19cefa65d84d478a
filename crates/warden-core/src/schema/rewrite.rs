use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A userset-rewrite tree: how a relation's userset is computed from other
/// usersets.
///
/// The wire form is a single-key JSON object naming the variant:
///
/// ```json
/// {"union": {"child": [
///     {"_this": {}},
///     {"computed_userset": {"relation": "editor"}},
///     {"tuple_to_userset": {
///         "tupleset": {"relation": "parent"},
///         "computed_userset": {"relation": "viewer"}}}
/// ]}}
/// ```
///
/// Decoding rejects nodes with zero or multiple variant keys, unknown
/// variant keys, and empty `union`/`intersection` child lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteNode {
    /// Subjects directly related through stored tuples.
    This,
    /// The userset of another relation on the same object.
    ComputedUserset { relation: String },
    /// Walk `tupleset_relation` tuples to other objects, then take
    /// `computed_relation` on each of them.
    TupleToUserset {
        tupleset_relation: String,
        computed_relation: String,
    },
    Union(Vec<RewriteNode>),
    Intersection(Vec<RewriteNode>),
    Exclusion {
        base: Box<RewriteNode>,
        subtract: Box<RewriteNode>,
    },
}

impl RewriteNode {
    pub fn this() -> Self {
        Self::This
    }

    pub fn computed_userset(relation: impl Into<String>) -> Self {
        Self::ComputedUserset {
            relation: relation.into(),
        }
    }

    pub fn tuple_to_userset(
        tupleset_relation: impl Into<String>,
        computed_relation: impl Into<String>,
    ) -> Self {
        Self::TupleToUserset {
            tupleset_relation: tupleset_relation.into(),
            computed_relation: computed_relation.into(),
        }
    }

    pub fn union(children: Vec<RewriteNode>) -> Self {
        Self::Union(children)
    }

    pub fn intersection(children: Vec<RewriteNode>) -> Self {
        Self::Intersection(children)
    }

    pub fn exclusion(base: RewriteNode, subtract: RewriteNode) -> Self {
        Self::Exclusion {
            base: Box::new(base),
            subtract: Box::new(subtract),
        }
    }
}

impl fmt::Display for RewriteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::This => write!(f, "this"),
            Self::ComputedUserset { relation } => write!(f, "{relation}"),
            Self::TupleToUserset {
                tupleset_relation,
                computed_relation,
            } => write!(f, "{tupleset_relation}->{computed_relation}"),
            Self::Union(children) => write_joined(f, children, " | "),
            Self::Intersection(children) => write_joined(f, children, " & "),
            Self::Exclusion { base, subtract } => write!(f, "({base}) - ({subtract})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[RewriteNode], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "({child})")?;
    }
    Ok(())
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireThis {}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireRelation {
    relation: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireTupleToUserset {
    tupleset: WireRelation,
    computed_userset: WireRelation,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireChildren {
    child: Vec<RewriteNode>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireExclusion {
    base: RewriteNode,
    subtract: RewriteNode,
}

impl Serialize for RewriteNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::This => map.serialize_entry("_this", &WireThis {})?,
            Self::ComputedUserset { relation } => map.serialize_entry(
                "computed_userset",
                &WireRelation {
                    relation: relation.clone(),
                },
            )?,
            Self::TupleToUserset {
                tupleset_relation,
                computed_relation,
            } => map.serialize_entry(
                "tuple_to_userset",
                &WireTupleToUserset {
                    tupleset: WireRelation {
                        relation: tupleset_relation.clone(),
                    },
                    computed_userset: WireRelation {
                        relation: computed_relation.clone(),
                    },
                },
            )?,
            Self::Union(children) => map.serialize_entry(
                "union",
                &WireChildren {
                    child: children.clone(),
                },
            )?,
            Self::Intersection(children) => map.serialize_entry(
                "intersection",
                &WireChildren {
                    child: children.clone(),
                },
            )?,
            Self::Exclusion { base, subtract } => map.serialize_entry(
                "exclusion",
                &WireExclusion {
                    base: (**base).clone(),
                    subtract: (**subtract).clone(),
                },
            )?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RewriteNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        if raw.len() != 1 {
            return Err(de::Error::custom(format!(
                "rewrite node must contain exactly one variant key, found {}",
                raw.len()
            )));
        }
        let (key, value) = raw.into_iter().next().expect("len checked above");

        match key.as_str() {
            "_this" => Ok(Self::This),
            "computed_userset" => {
                let wire: WireRelation =
                    serde_json::from_value(value).map_err(de::Error::custom)?;
                Ok(Self::ComputedUserset {
                    relation: wire.relation,
                })
            }
            "tuple_to_userset" => {
                let wire: WireTupleToUserset =
                    serde_json::from_value(value).map_err(de::Error::custom)?;
                Ok(Self::TupleToUserset {
                    tupleset_relation: wire.tupleset.relation,
                    computed_relation: wire.computed_userset.relation,
                })
            }
            "union" => {
                let wire: WireChildren =
                    serde_json::from_value(value).map_err(de::Error::custom)?;
                if wire.child.is_empty() {
                    return Err(de::Error::custom("union must have at least one child"));
                }
                Ok(Self::Union(wire.child))
            }
            "intersection" => {
                let wire: WireChildren =
                    serde_json::from_value(value).map_err(de::Error::custom)?;
                if wire.child.is_empty() {
                    return Err(de::Error::custom(
                        "intersection must have at least one child",
                    ));
                }
                Ok(Self::Intersection(wire.child))
            }
            "exclusion" => {
                let wire: WireExclusion =
                    serde_json::from_value(value).map_err(de::Error::custom)?;
                Ok(Self::exclusion(wire.base, wire.subtract))
            }
            other => Err(de::Error::custom(format!(
                "unknown userset rewrite variant '{other}'"
            ))),
        }
    }
}
