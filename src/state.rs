use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::utils::image::ImageHost;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub cache: Arc<ResponseCache>,
    pub images: Arc<dyn ImageHost>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<ResponseCache> {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}
