use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A principal, resource or subject referenced by its `<type>:<id>` form.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub principal: EntityRef,
    pub resource: EntityRef,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub decision: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipRequest {
    pub resource: EntityRef,
    pub relation: String,
    pub subject: EntityRef,
}

#[derive(Debug, Serialize)]
pub struct RelationshipResponse {
    pub zookie_token: String,
}

#[derive(Debug, Serialize)]
pub struct ListedRelationship {
    pub resource: String,
    pub relation: String,
    pub subject: String,
    pub zookie_token: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub subjects: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
