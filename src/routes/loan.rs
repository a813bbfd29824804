//! Loan route definitions

use axum::{routing::get, routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans))
        .route("/api/loans", post(create_loan))
        .route("/api/loans/active-count", get(active_loan_count))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/payments", post(make_payment))
        .route("/api/loans/:id/bundles", get(bundles_by_loan))
}
