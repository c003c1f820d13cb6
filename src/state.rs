use std::sync::Arc;

use crate::{config::Config, scoring::RemediationCatalog};
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub remediation: Arc<RemediationCatalog>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<RemediationCatalog> {
    fn from_ref(state: &AppState) -> Self {
        state.remediation.clone()
    }
}
