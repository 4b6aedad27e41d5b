use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::identity::AuthContext;
use crate::models::template::{NewTemplate, Template, TemplateCatalog, TemplatePatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TemplateFilter {
    pub category: Option<String>,
    pub is_premium: Option<bool>,
}

/// `?default=true` selects the default catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub default: bool,
}

impl CatalogQuery {
    fn catalog(&self) -> TemplateCatalog {
        TemplateCatalog::from_is_default(self.default)
    }
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    Query(filter): Query<TemplateFilter>,
) -> Result<Json<Vec<Template>>, AppError> {
    let templates = state
        .data
        .get_templates(filter.category.as_deref(), filter.is_premium)
        .await?;
    Ok(Json(templates))
}

/// GET /api/v1/templates/defaults
pub async fn handle_list_default_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Template>>, AppError> {
    Ok(Json(state.data.get_default_templates().await?))
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Template>, AppError> {
    Ok(Json(state.data.get_template_by_id(&id, q.default).await?))
}

/// POST /api/v1/templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<CatalogQuery>,
    Json(req): Json<NewTemplate>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let template = state.data.create_template(&auth, q.catalog(), req).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PATCH /api/v1/templates/:id
pub async fn handle_update_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Query(q): Query<CatalogQuery>,
    Json(patch): Json<TemplatePatch>,
) -> Result<Json<Template>, AppError> {
    Ok(Json(
        state
            .data
            .update_template(&auth, q.catalog(), &id, patch)
            .await?,
    ))
}

/// DELETE /api/v1/templates/:id
pub async fn handle_delete_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Query(q): Query<CatalogQuery>,
) -> Result<StatusCode, AppError> {
    state.data.delete_template(&auth, q.catalog(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
