//! Story API handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::Session;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::story::{CreateStoryRequest, Story, StoryFeedEntry};
use crate::story_service::StoryService;

/// GET /api/stories - The community story feed
pub async fn story_feed(
    State(story_service): State<Arc<StoryService>>,
) -> Result<Json<ApiResponse<Vec<StoryFeedEntry>>>, ApiError> {
    let stories = story_service.feed().await?;
    Ok(Json(ApiResponse::ok(stories)))
}

/// POST /api/stories - Share a story about one of the caller's loans
pub async fn create_story(
    State(story_service): State<Arc<StoryService>>,
    session: Session,
    Json(request): Json<CreateStoryRequest>,
) -> Result<Json<ApiResponse<Story>>, ApiError> {
    let story = story_service.create_story(session.user_id, request).await?;
    Ok(Json(ApiResponse::ok(story)))
}
