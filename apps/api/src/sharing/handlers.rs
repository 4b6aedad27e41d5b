use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::identity::AuthContext;
use crate::models::resume::SharedResume;
use crate::sharing::ReconcileReport;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ShareRequest {
    pub expires_in_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub public_url: String,
}

/// POST /api/v1/resumes/:id/share
/// An empty body means the link never expires. Any other body must be a
/// valid `ShareRequest`.
pub async fn handle_share(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ShareResponse>, AppError> {
    let req = parse_share_request(&body)?;
    let public_url = state
        .data
        .share_resume(&auth, &id, req.expires_in_days)
        .await?;
    Ok(Json(ShareResponse { public_url }))
}

fn parse_share_request(body: &[u8]) -> Result<ShareRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ShareRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid share request: {e}")))
}

/// DELETE /api/v1/resumes/:id/share
pub async fn handle_unshare(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.data.unshare_resume(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sharing/reconcile
pub async fn handle_reconcile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ReconcileReport>, AppError> {
    Ok(Json(state.data.reconcile_sharing(&auth).await?))
}

/// GET /api/v1/shared/:id
/// Public; no identity headers required.
pub async fn handle_get_shared(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SharedResume>, AppError> {
    Ok(Json(state.data.get_shared_resume(&id).await?))
}
