use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::object::{ObjectRef, SubjectRef};

/// A zookie: opaque proof that all changes up to a point are visible.
///
/// Tokens minted by one store instance are strictly increasing in issue
/// order. Tokens from distinct store instances are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zookie(u64);

impl Zookie {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Zookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zk_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed zookie token '{0}'")]
pub struct MalformedZookie(pub String);

impl FromStr for Zookie {
    type Err = MalformedZookie;

    fn from_str(s: &str) -> Result<Self, MalformedZookie> {
        let n = s
            .strip_prefix("zk_")
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| MalformedZookie(s.to_string()))?;
        Ok(Self(n))
    }
}

/// A stored relationship tuple plus its write metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub resource: ObjectRef,
    pub relation: String,
    pub subject: SubjectRef,
    pub zookie: Zookie,
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Whether this tuple matches a `(resource, relation, subject)` triple.
    pub fn matches(&self, resource: &ObjectRef, relation: &str, subject: &SubjectRef) -> bool {
        self.resource == *resource && self.relation == relation && self.subject == *subject
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.resource, self.relation, self.subject)
    }
}
