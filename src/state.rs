use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::services::EventPublisher;

/// Shared handles cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub events: EventPublisher,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, events: EventPublisher, config: Config) -> Self {
        Self { db, events, config: Arc::new(config) }
    }
}
