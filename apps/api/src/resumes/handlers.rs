use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::identity::AuthContext;
use crate::models::resume::{NewResume, Resume, ResumePatch};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateResumeResponse {
    pub id: String,
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(state.data.get_resumes(&auth).await?))
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<NewResume>,
) -> Result<(StatusCode, Json<CreateResumeResponse>), AppError> {
    let id = state.data.create_resume(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(CreateResumeResponse { id })))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.data.get_resume_by_id(&auth, &id).await?))
}

/// PATCH /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(patch): Json<ResumePatch>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.data.update_resume(&auth, &id, patch).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.data.delete_resume(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
