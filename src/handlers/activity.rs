//! Activity feed API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::activity::{Activity, RecentActivitiesQuery};
use crate::activity_service::ActivityService;
use crate::auth::Session;
use crate::error::ApiError;
use crate::models::ApiResponse;

/// GET /api/activities - The authenticated user's recent activities
pub async fn recent_activities(
    State(activity_service): State<Arc<ActivityService>>,
    session: Session,
    Query(query): Query<RecentActivitiesQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, ApiError> {
    let activities = activity_service.recent(session.user_id, query.limit).await?;
    Ok(Json(ApiResponse::ok(activities)))
}
