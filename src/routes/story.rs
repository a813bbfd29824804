//! Story route definitions

use axum::{routing::get, routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn story_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stories", get(story_feed))
        .route("/api/stories", post(create_story))
}
