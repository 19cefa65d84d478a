mod handlers;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use warden_core::schema::SharedSchema;
use warden_store::TupleStore;

pub struct AppState<S: TupleStore> {
    pub store: Arc<S>,
    pub schema: SharedSchema,
}

impl<S: TupleStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            schema: self.schema.clone(),
        }
    }
}

pub fn create_router<S: TupleStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/v1/authorize", post(handlers::authorize))
        .route(
            "/v1/relationships",
            post(handlers::add_relationship)
                .delete(handlers::remove_relationship)
                .get(handlers::list_relationships),
        )
        .route(
            "/v1/resources/:resource_id/relations/:relation/subjects",
            get(handlers::expand_subjects),
        )
        .route(
            "/v1/schema",
            get(handlers::get_schema).put(handlers::put_schema),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}
