//! Story models
//!
//! Stories are community posts tied to a loan: a borrower sharing what the
//! loan funded. Images live in object storage; only the URL is persisted.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::loan::Currency;

/// Story model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub loan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub purpose: String,
    pub amount_cents: i64,
    pub currency: Currency,
    pub likes: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Story enriched with author details for the feed
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StoryFeedEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub loan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub purpose: String,
    pub amount_cents: i64,
    pub currency: Currency,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_country: Option<String>,
}

/// Request to share a story about one of the caller's loans
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoryRequest {
    pub loan_id: Uuid,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: String,
}
