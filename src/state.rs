use std::sync::Arc;

use crate::{auth::Accounts, config::AppConfig, engine::JobEngine};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<JobEngine>,
    pub accounts: Arc<Accounts>,
}

impl AppState {
    pub fn new(config: AppConfig, engine: JobEngine, accounts: Accounts) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            accounts: Arc::new(accounts),
        }
    }
}
