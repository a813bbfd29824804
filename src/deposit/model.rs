//! Deposit models
//!
//! A deposit row tracks one gateway checkout from order creation through
//! balance credit. Its unique gateway order id is the dedup key that keeps
//! the completion step safe to retry.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::loan::Currency;

/// Deposit lifecycle status
///
/// created -> captured -> credited, with failed as a terminal side exit.
/// The gap between captured and credited is exactly the window where money
/// exists externally but not internally; completion can be re-run until the
/// row reaches credited.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "deposit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Created,
    Captured,
    Credited,
    Failed,
}

/// Deposit model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Deposit {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Gateway order id; unique, used to correlate the redirect callback
    pub order_id: String,
    /// Amount requested at initiation
    pub amount_cents: i64,
    /// Amount actually captured by the gateway, once known
    pub captured_amount_cents: Option<i64>,
    /// Gateway capture id, once known
    pub capture_id: Option<String>,
    pub currency: Currency,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to start a deposit checkout
#[derive(Debug, Deserialize, Validate)]
pub struct InitiateDepositRequest {
    #[validate(range(min = 1, message = "Deposit amount must be positive"))]
    pub amount_cents: i64,
    pub currency: Currency,
}

/// Response to a started checkout: the client redirects the user to
/// `approval_url` and the gateway later redirects back with the order token.
#[derive(Debug, Serialize)]
pub struct InitiateDepositResponse {
    pub deposit_id: Uuid,
    pub order_id: String,
    pub approval_url: String,
}

/// Redirect callback payload carrying the gateway order token
#[derive(Debug, Deserialize)]
pub struct CompleteDepositRequest {
    pub order_token: String,
}

/// Result of a completed deposit
#[derive(Debug, Serialize)]
pub struct DepositReceipt {
    pub deposit_id: Uuid,
    pub credited_cents: i64,
    pub new_balance_cents: i64,
}
