//! User profile API handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::Session;
use crate::error::ApiError;
use crate::models::{
    ApiResponse, CreateUserRequest, SetProfilePictureRequest, UpdateProfileRequest, UserResponse,
};
use crate::user_service::UserService;

/// POST /api/users - Create the profile for the authenticated identity
pub async fn create_user(
    State(user_service): State<Arc<UserService>>,
    session: Session,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = user_service.create_user(session.user_id, request).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// GET /api/users/me - Get the authenticated user's profile
pub async fn get_profile(
    State(user_service): State<Arc<UserService>>,
    session: Session,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = user_service.get_user(session.user_id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/users/me - Update the authenticated user's profile
pub async fn update_profile(
    State(user_service): State<Arc<UserService>>,
    session: Session,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = user_service.update_profile(session.user_id, request).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/users/me/picture - Set profile picture metadata
pub async fn set_profile_picture(
    State(user_service): State<Arc<UserService>>,
    session: Session,
    Json(request): Json<SetProfilePictureRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = user_service
        .set_profile_picture(session.user_id, request)
        .await?;
    Ok(Json(ApiResponse::ok(user.into())))
}
