//! Bundle API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Session;
use crate::bundle::{Bundle, BundleService, CreateBundleRequest, UpdateBundleRequest};
use crate::error::ApiError;
use crate::models::ApiResponse;

/// GET /api/bundles - List active bundles with freshly derived rates
pub async fn list_bundles(
    State(bundle_service): State<Arc<BundleService>>,
) -> Result<Json<ApiResponse<Vec<Bundle>>>, ApiError> {
    let bundles = bundle_service.list_active_bundles().await?;
    Ok(Json(ApiResponse::ok(bundles)))
}

/// GET /api/bundles/:id - Get a bundle with a freshly derived rate
pub async fn get_bundle(
    State(bundle_service): State<Arc<BundleService>>,
    Path(bundle_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Bundle>>, ApiError> {
    let bundle = bundle_service.get_bundle(bundle_id).await?;
    Ok(Json(ApiResponse::ok(bundle)))
}

/// POST /api/bundles - Create a bundle
pub async fn create_bundle(
    State(bundle_service): State<Arc<BundleService>>,
    _session: Session,
    Json(request): Json<CreateBundleRequest>,
) -> Result<Json<ApiResponse<Bundle>>, ApiError> {
    let bundle = bundle_service.create_bundle(request).await?;
    Ok(Json(ApiResponse::ok(bundle)))
}

/// PUT /api/bundles/:id - Update a bundle
pub async fn update_bundle(
    State(bundle_service): State<Arc<BundleService>>,
    _session: Session,
    Path(bundle_id): Path<Uuid>,
    Json(request): Json<UpdateBundleRequest>,
) -> Result<Json<ApiResponse<Bundle>>, ApiError> {
    let bundle = bundle_service.update_bundle(bundle_id, request).await?;
    Ok(Json(ApiResponse::ok(bundle)))
}

/// POST /api/bundles/:id/loans/:loan_id - Add a loan to a bundle
pub async fn add_bundle_loan(
    State(bundle_service): State<Arc<BundleService>>,
    _session: Session,
    Path((bundle_id, loan_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Bundle>>, ApiError> {
    let bundle = bundle_service.add_loan(bundle_id, loan_id).await?;
    Ok(Json(ApiResponse::ok(bundle)))
}

/// DELETE /api/bundles/:id/loans/:loan_id - Remove a loan from a bundle
pub async fn remove_bundle_loan(
    State(bundle_service): State<Arc<BundleService>>,
    _session: Session,
    Path((bundle_id, loan_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Bundle>>, ApiError> {
    let bundle = bundle_service.remove_loan(bundle_id, loan_id).await?;
    Ok(Json(ApiResponse::ok(bundle)))
}

/// DELETE /api/bundles/:id - Delete a bundle (member loans are untouched)
pub async fn delete_bundle(
    State(bundle_service): State<Arc<BundleService>>,
    _session: Session,
    Path(bundle_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    bundle_service.delete_bundle(bundle_id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// GET /api/loans/:id/bundles - List bundles containing a loan
pub async fn bundles_by_loan(
    State(bundle_service): State<Arc<BundleService>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Bundle>>>, ApiError> {
    let bundles = bundle_service.bundles_by_loan(loan_id).await?;
    Ok(Json(ApiResponse::ok(bundles)))
}
