use crate::config::Config;
use crate::dal::DataAccess;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub data: DataAccess,
    pub config: Config,
}
