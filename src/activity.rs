//! Activity models
//!
//! Activities are an append-only record of financial events. No update or
//! delete path exists anywhere in the service layer.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Kind of financial event an activity records
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "activity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Investment,
    Return,
    Loan,
    Deposit,
    Withdrawal,
}

/// Activity lifecycle status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "activity_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Completed,
    Failed,
    Received,
    Active,
}

/// Activity model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Activity {
    pub id: Uuid,
    pub activity_type: ActivityType,
    pub amount_cents: i64,
    pub date: DateTime<Utc>,
    pub status: ActivityStatus,
    pub user_id: Uuid,
    pub description: Option<String>,
    /// Links the event to a loan, bundle, or gateway payment id
    pub reference_id: Option<String>,
}

/// Input for recording a new activity
#[derive(Debug, Deserialize)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub amount_cents: i64,
    pub status: ActivityStatus,
    pub user_id: Uuid,
    pub description: Option<String>,
    pub reference_id: Option<String>,
}

/// Query for the recent-activities feed
#[derive(Debug, Deserialize)]
pub struct RecentActivitiesQuery {
    pub limit: Option<i64>,
}
