use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed reference '{0}': expected <type>:<id>")]
pub struct MalformedRef(pub String);

/// A resource reference of the form `<type>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub object_type: String,
    pub object_id: String,
}

impl ObjectRef {
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

impl FromStr for ObjectRef {
    type Err = MalformedRef;

    fn from_str(s: &str) -> Result<Self, MalformedRef> {
        let (object_type, object_id) = s
            .split_once(':')
            .ok_or_else(|| MalformedRef(s.to_string()))?;
        if object_type.is_empty() {
            return Err(MalformedRef(s.to_string()));
        }
        Ok(Self::new(object_type, object_id))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

/// A subject reference: `<type>:<id>`, or `<type>:<id>#<relation>` for a
/// userset reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectRef {
    pub subject_type: String,
    pub subject_id: String,
    pub subject_relation: Option<String>,
}

impl SubjectRef {
    pub fn direct(subject_type: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            subject_relation: None,
        }
    }

    pub fn userset(
        subject_type: impl Into<String>,
        subject_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            subject_relation: Some(relation.into()),
        }
    }

    /// The `<type>:<id>` part, without any `#<relation>` suffix.
    pub fn object_part(&self) -> ObjectRef {
        ObjectRef::new(&self.subject_type, &self.subject_id)
    }
}

impl FromStr for SubjectRef {
    type Err = MalformedRef;

    fn from_str(s: &str) -> Result<Self, MalformedRef> {
        let (base, relation) = match s.split_once('#') {
            Some((base, rel)) if !rel.is_empty() => (base, Some(rel)),
            Some(_) => return Err(MalformedRef(s.to_string())),
            None => (s, None),
        };
        let object: ObjectRef = base.parse().map_err(|_| MalformedRef(s.to_string()))?;
        Ok(Self {
            subject_type: object.object_type,
            subject_id: object.object_id,
            subject_relation: relation.map(str::to_string),
        })
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.subject_id)?;
        if let Some(ref rel) = self.subject_relation {
            write!(f, "#{rel}")?;
        }
        Ok(())
    }
}
