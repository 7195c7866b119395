// Application state module
// Everything a request handler needs, built once from the configuration

use super::types::Config;
use crate::http::cors::CorsPolicy;
use crate::storage::ModelStore;

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    pub store: ModelStore,
    pub cors: CorsPolicy,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = ModelStore::new(&config.storage);
        let cors = CorsPolicy::new(&config.cors);
        Self {
            config,
            store,
            cors,
        }
    }
}
