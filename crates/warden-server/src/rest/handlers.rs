use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use warden_core::schema::Schema;
use warden_store::{StoreError, TupleStore};

use crate::audit;

use super::AppState;
use super::types::*;

fn error_body(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: message.into(),
    })
}

pub async fn authorize<S: TupleStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<AuthorizeRequest>,
) -> impl IntoResponse {
    if req.principal.id.is_empty() || req.resource.id.is_empty() || req.action.is_empty() {
        return (StatusCode::BAD_REQUEST, error_body("missing required fields")).into_response();
    }

    match state
        .store
        .check(&req.principal.id, &req.resource.id, &req.action)
    {
        Ok(decision) => {
            let verdict = if decision.allowed { "ALLOW" } else { "DENY" };
            let response = AuthorizeResponse {
                decision: verdict.to_string(),
                reason: decision.reason,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(StoreError::MalformedRef(e)) => {
            (StatusCode::BAD_REQUEST, error_body(e.to_string())).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())).into_response(),
    }
}

pub async fn add_relationship<S: TupleStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<RelationshipRequest>,
) -> impl IntoResponse {
    if req.resource.id.is_empty() || req.relation.is_empty() || req.subject.id.is_empty() {
        return (StatusCode::BAD_REQUEST, error_body("missing required fields")).into_response();
    }

    match state
        .store
        .add(&req.resource.id, &req.relation, &req.subject.id)
    {
        Ok(outcome) => {
            audit::relationship_added(
                &req.resource.id,
                &req.relation,
                &req.subject.id,
                &outcome.zookie,
                outcome.created,
            );
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let response = RelationshipResponse {
                zookie_token: outcome.zookie.to_string(),
            };
            (status, Json(response)).into_response()
        }
        Err(e @ (StoreError::MalformedRef(_) | StoreError::Schema(_))) => {
            (StatusCode::BAD_REQUEST, error_body(e.to_string())).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())).into_response(),
    }
}

pub async fn remove_relationship<S: TupleStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<RelationshipRequest>,
) -> impl IntoResponse {
    if req.resource.id.is_empty() || req.relation.is_empty() || req.subject.id.is_empty() {
        return (StatusCode::BAD_REQUEST, error_body("missing required fields")).into_response();
    }

    match state
        .store
        .remove(&req.resource.id, &req.relation, &req.subject.id)
    {
        Ok(()) => {
            audit::relationship_removed(&req.resource.id, &req.relation, &req.subject.id);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, error_body("relationship not found")).into_response()
        }
        Err(StoreError::MalformedRef(e)) => {
            (StatusCode::BAD_REQUEST, error_body(e.to_string())).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())).into_response(),
    }
}

pub async fn list_relationships<S: TupleStore>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let listed: Vec<ListedRelationship> = state
        .store
        .list()
        .into_iter()
        .map(|r| ListedRelationship {
            resource: r.resource.to_string(),
            relation: r.relation,
            subject: r.subject.to_string(),
            zookie_token: r.zookie.to_string(),
            updated_at: r.updated_at,
        })
        .collect();

    (StatusCode::OK, Json(listed))
}

pub async fn expand_subjects<S: TupleStore>(
    State(state): State<AppState<S>>,
    Path((resource_id, relation)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.store.expand(&resource_id, &relation) {
        Ok(subjects) => {
            let response = ExpandResponse {
                subjects: subjects.iter().map(ToString::to_string).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(StoreError::MalformedRef(e)) => {
            (StatusCode::BAD_REQUEST, error_body(e.to_string())).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())).into_response(),
    }
}

pub async fn get_schema<S: TupleStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let schema = state.schema.load();
    (StatusCode::OK, Json(schema.as_ref().clone()))
}

pub async fn put_schema<S: TupleStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    match serde_json::from_value::<Schema>(body) {
        Ok(schema) => {
            let type_count = schema.definitions.len();
            state.schema.replace(schema);
            audit::schema_replaced(type_count);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            error_body(format!("invalid schema: {e}")),
        )
            .into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}
