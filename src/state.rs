use std::sync::Arc;

use crate::accounts::repo::AccountStore;
use crate::config::AppConfig;

/// Shared application state. The store handle is opened once at startup
/// and injected into every handler; each operation borrows a pool
/// connection for its own duration only.
#[derive(Clone)]
pub struct AppState {
    pub store: AccountStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = AccountStore::connect(&config.database_url).await?;
        Ok(Self { store, config })
    }
}
