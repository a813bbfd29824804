//! Story service layer - community posts tied to loans

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::loan::LoanRow;
use crate::story::{CreateStoryRequest, Story, StoryFeedEntry};

/// Story service
#[derive(Clone)]
pub struct StoryService {
    db_pool: PgPool,
}

impl StoryService {
    /// Create a new story service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Share a story about one of the caller's own loans.
    ///
    /// Purpose, amount, and currency are copied from the loan so the story
    /// stays meaningful even if the loan later changes.
    pub async fn create_story(
        &self,
        user_id: Uuid,
        request: CreateStoryRequest,
    ) -> ApiResult<Story> {
        request.validate()?;

        let loan_row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1")
            .bind(request.loan_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        if loan_row.user_id != user_id {
            return Err(ApiError::Forbidden(
                "Cannot share a story about another user's loan".to_string(),
            ));
        }

        let story = sqlx::query_as::<_, Story>(
            r#"
            INSERT INTO stories (
                id, user_id, loan_id, title, description, image_url, purpose,
                amount_cents, currency, likes, active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, TRUE, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.loan_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(&loan_row.purpose)
        .bind(loan_row.loaned_amount_cents)
        .bind(loan_row.currency)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(story_id = %story.id, loan_id = %request.loan_id, "Story shared");

        Ok(story)
    }

    /// List the community feed, newest first, with author name and country
    pub async fn feed(&self) -> ApiResult<Vec<StoryFeedEntry>> {
        let stories = sqlx::query_as::<_, StoryFeedEntry>(
            r#"
            SELECT
                s.id, s.user_id, s.loan_id, s.title, s.description, s.image_url,
                s.purpose, s.amount_cents, s.currency, s.likes, s.created_at,
                u.name AS user_name, u.country AS user_country
            FROM stories s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.active = TRUE
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(stories)
    }
}
