use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::CatalogConfig, notify::OrderNotifier};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub catalog: CatalogConfig,
    pub notifier: Arc<dyn OrderNotifier>,
}
