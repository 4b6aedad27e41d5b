use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::analytics::new_event;
use crate::dal::validate_text;
use crate::errors::AppError;
use crate::identity::AuthContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClientEvent {
    pub event_type: String,
    pub resume_id: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

/// POST /api/v1/analytics/events
///
/// Accepted even for anonymous callers; the write happens in the background.
pub async fn handle_log_event(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ClientEvent>,
) -> Result<StatusCode, AppError> {
    let event_type = validate_text("event_type", &req.event_type, 64)?;
    let user_id = auth.identity().map(|i| i.id.as_str());
    state.data.log_event(new_event(
        &event_type,
        user_id,
        req.resume_id.as_deref(),
        req.metadata,
    ));
    Ok(StatusCode::ACCEPTED)
}
