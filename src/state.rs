use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::draw::DrawService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
    /// Draw trigger with its per-group locks and RNG
    pub draws: DrawService,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let draws = DrawService::new(config.draw.seed);

        Self {
            db,
            config: Arc::new(config),
            draws,
        }
    }
}
