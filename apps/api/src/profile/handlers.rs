use axum::{extract::State, Json};
use serde::Serialize;

use crate::dal::now;
use crate::errors::AppError;
use crate::identity::AuthContext;
use crate::models::user::{PreferencesPatch, ProfilePatch, UserProfile, UserSettings};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub has_active_subscription: bool,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let has_active_subscription = profile.has_active_subscription(now());
        Self {
            profile,
            has_active_subscription,
        }
    }
}

/// POST /api/v1/session
/// Called by the client after every sign-in.
pub async fn handle_session(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.data.ensure_user_profile(&auth).await?;
    Ok(Json(profile.into()))
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.data.get_user_profile(&auth).await?;
    Ok(Json(profile.into()))
}

/// PATCH /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.data.update_user_profile(&auth, patch).await?;
    Ok(Json(profile.into()))
}

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<UserSettings>, AppError> {
    Ok(Json(state.data.get_user_settings(&auth).await?))
}

/// PATCH /api/v1/settings
pub async fn handle_update_preferences(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<UserSettings>, AppError> {
    Ok(Json(state.data.update_user_preferences(&auth, patch).await?))
}
