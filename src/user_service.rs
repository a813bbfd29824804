//! User service layer - profile management
//!
//! The balance is deliberately absent from every update path here: it is
//! only mutated inside the loan payment and deposit credit transactions.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateUserRequest, SetProfilePictureRequest, UpdateProfileRequest, User};

/// User service
#[derive(Clone)]
pub struct UserService {
    db_pool: PgPool,
}

impl UserService {
    /// Create a new user service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create the profile row for a freshly signed-up identity.
    ///
    /// The id comes from the identity provider's stable user id.
    pub async fn create_user(&self, user_id: Uuid, request: CreateUserRequest) -> ApiResult<User> {
        request.validate()?;

        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, name, email, country, region, gender, risk_score,
                balance_cents, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.country)
        .bind(&request.region)
        .bind(request.gender)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user.id, "User profile created");

        Ok(user)
    }

    /// Get a user's profile
    pub async fn get_user(&self, user_id: Uuid) -> ApiResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Update the editable profile fields
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> ApiResult<User> {
        request.validate()?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                gender = COALESCE($2, gender),
                updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(request.name)
        .bind(request.gender)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Set profile picture metadata after an upload to object storage
    pub async fn set_profile_picture(
        &self,
        user_id: Uuid,
        request: SetProfilePictureRequest,
    ) -> ApiResult<User> {
        request.validate()?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET profile_picture_url = $1,
                profile_picture_width = $2,
                profile_picture_height = $3,
                updated_at = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&request.url)
        .bind(request.width)
        .bind(request.height)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(user)
    }
}
