//! Deposit route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn deposit_routes() -> Router<AppState> {
    Router::new()
        .route("/api/deposits", post(initiate_deposit))
        .route("/api/deposits/complete", post(complete_deposit))
}
