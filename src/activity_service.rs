//! Activity service layer - append-only financial event log

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::activity::{Activity, NewActivity};
use crate::error::ApiResult;

/// Default number of entries returned by the recent-activities feed
const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Maximum number of entries a caller may request in one page
const MAX_RECENT_LIMIT: i64 = 100;

/// Activity service
#[derive(Clone)]
pub struct ActivityService {
    db_pool: PgPool,
}

impl ActivityService {
    /// Create a new activity service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Append a new activity record
    pub async fn record(&self, input: NewActivity) -> ApiResult<Activity> {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (
                id, activity_type, amount_cents, date, status, user_id,
                description, reference_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.activity_type)
        .bind(input.amount_cents)
        .bind(Utc::now())
        .bind(input.status)
        .bind(input.user_id)
        .bind(input.description)
        .bind(input.reference_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(activity)
    }

    /// Get a user's most recent activities, newest first
    pub async fn recent(&self, user_id: Uuid, limit: Option<i64>) -> ApiResult<Vec<Activity>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT);

        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(activities)
    }
}
