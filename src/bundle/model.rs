//! Bundle models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Bundle model
///
/// `i_rate` is a pure function of the member loans' default rates and the
/// risk multiplier `m`. The stored value is refreshed on every read and
/// mutation and is never trusted for pricing decisions on its own.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bundle {
    pub id: Uuid,
    /// Sequential human-facing bundle number, starting at 1
    pub bundle_id: i32,
    /// Non-owning references to member loans
    pub loan_ids: Vec<Uuid>,
    /// Risk multiplier, strictly positive
    pub m: f64,
    pub name: String,
    pub description: String,
    pub value_cents: i64,
    pub active: bool,
    pub i_rate: f64,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Request to create a bundle
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBundleRequest {
    #[validate(length(min = 1, message = "At least one loan is required"))]
    pub loan_ids: Vec<Uuid>,
    #[validate(range(min = 0.000001, max = 10.0, message = "Risk multiplier must be in (0, 10]"))]
    pub m: f64,
    #[validate(length(min = 1, message = "Bundle name is required"))]
    pub name: String,
    pub description: String,
    #[validate(range(min = 1, message = "Bundle value must be positive"))]
    pub value_cents: i64,
    pub end_date: DateTime<Utc>,
}

/// Request to update a bundle.
///
/// Changing `loan_ids` or `m` triggers an interest rate recomputation.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBundleRequest {
    pub loan_ids: Option<Vec<Uuid>>,
    #[validate(range(min = 0.000001, max = 10.0, message = "Risk multiplier must be in (0, 10]"))]
    pub m: Option<f64>,
    #[validate(length(min = 1, message = "Bundle name is required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Bundle value must be positive"))]
    pub value_cents: Option<i64>,
    pub active: Option<bool>,
    pub end_date: Option<DateTime<Utc>>,
}
