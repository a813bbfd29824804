//! Activity route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/api/activities", get(recent_activities))
}
