//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::activity_service::ActivityService;
use crate::auth::SessionVerifier;
use crate::bundle::BundleService;
use crate::deposit::DepositService;
use crate::loan_service::LoanService;
use crate::story_service::StoryService;
use crate::user_service::UserService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub loan_service: Arc<LoanService>,
    pub bundle_service: Arc<BundleService>,
    pub activity_service: Arc<ActivityService>,
    pub deposit_service: Arc<DepositService>,
    pub story_service: Arc<StoryService>,
    pub session_verifier: SessionVerifier,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_service: Arc<UserService>,
        loan_service: Arc<LoanService>,
        bundle_service: Arc<BundleService>,
        activity_service: Arc<ActivityService>,
        deposit_service: Arc<DepositService>,
        story_service: Arc<StoryService>,
        session_verifier: SessionVerifier,
    ) -> Self {
        Self {
            user_service,
            loan_service,
            bundle_service,
            activity_service,
            deposit_service,
            story_service,
            session_verifier,
        }
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.user_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<BundleService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.bundle_service.clone()
    }
}

impl FromRef<AppState> for Arc<ActivityService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.activity_service.clone()
    }
}

impl FromRef<AppState> for Arc<DepositService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.deposit_service.clone()
    }
}

impl FromRef<AppState> for Arc<StoryService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.story_service.clone()
    }
}

impl FromRef<AppState> for SessionVerifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_verifier.clone()
    }
}
