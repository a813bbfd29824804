//! Shared data models for the Bundle backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// User gender
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// Profile picture metadata. The image itself lives in object storage;
/// we only persist its URL and dimensions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProfilePicture {
    pub url: String,
    pub width: i32,
    pub height: i32,
}

/// User model
///
/// Balance is held in integer cents and is only ever mutated by the two
/// transactional paths (loan payment, deposit credit).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub country: String,
    pub region: String,
    pub gender: Gender,
    pub risk_score: i32,
    pub balance_cents: i64,
    pub profile_picture_url: Option<String>,
    pub profile_picture_width: Option<i32>,
    pub profile_picture_height: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile_picture(&self) -> Option<ProfilePicture> {
        match (
            &self.profile_picture_url,
            self.profile_picture_width,
            self.profile_picture_height,
        ) {
            (Some(url), Some(width), Some(height)) => Some(ProfilePicture {
                url: url.clone(),
                width,
                height,
            }),
            _ => None,
        }
    }
}

/// User profile as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub country: String,
    pub region: String,
    pub gender: Gender,
    pub risk_score: i32,
    pub balance_cents: i64,
    pub profile_picture: Option<ProfilePicture>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let profile_picture = user.profile_picture();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            country: user.country,
            region: user.region,
            gender: user.gender,
            risk_score: user.risk_score,
            balance_cents: user.balance_cents,
            profile_picture,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request to create a user profile after sign-up with the identity provider
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "Region is required"))]
    pub region: String,
    pub gender: Gender,
}

/// Request to update a user's editable profile fields.
///
/// Country and region are fixed at sign-up; id, balance, and timestamps are
/// never client-writable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    pub gender: Option<Gender>,
}

/// Request to set profile picture metadata after an object-storage upload
#[derive(Debug, Deserialize, Validate)]
pub struct SetProfilePictureRequest {
    #[validate(url(message = "Invalid picture URL"))]
    pub url: String,
    #[validate(range(min = 1, message = "Width must be positive"))]
    pub width: i32,
    #[validate(range(min = 1, message = "Height must be positive"))]
    pub height: i32,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_profile_picture_requires_all_fields() {
        let mut user = sample_user();
        assert!(user.profile_picture().is_none());

        user.profile_picture_url = Some("https://cdn.example.com/p/1".to_string());
        // Missing dimensions: still no picture
        assert!(user.profile_picture().is_none());

        user.profile_picture_width = Some(320);
        user.profile_picture_height = Some(240);
        let pic = user.profile_picture().unwrap();
        assert_eq!(pic.width, 320);
        assert_eq!(pic.height, 240);
    }

    #[test]
    fn test_create_user_request_validation() {
        let req = CreateUserRequest {
            name: "".to_string(),
            email: "not-an-email".to_string(),
            country: "US".to_string(),
            region: "CA".to_string(),
            gender: Gender::PreferNotToSay,
        };
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("name"));
        assert!(err.field_errors().contains_key("email"));
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            country: "UK".to_string(),
            region: "London".to_string(),
            gender: Gender::Female,
            risk_score: 0,
            balance_cents: 0,
            profile_picture_url: None,
            profile_picture_width: None,
            profile_picture_height: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
