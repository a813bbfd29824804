//! User route definitions

use axum::{routing::get, routing::post, routing::put, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/me", get(get_profile))
        .route("/api/users/me", put(update_profile))
        .route("/api/users/me/picture", put(set_profile_picture))
}
