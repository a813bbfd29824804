//! Bundle route definitions

use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn bundle_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bundles", get(list_bundles))
        .route("/api/bundles", post(create_bundle))
        .route("/api/bundles/:id", get(get_bundle))
        .route("/api/bundles/:id", put(update_bundle))
        .route("/api/bundles/:id", delete(delete_bundle))
        .route("/api/bundles/:id/loans/:loan_id", post(add_bundle_loan))
        .route("/api/bundles/:id/loans/:loan_id", delete(remove_bundle_loan))
}
