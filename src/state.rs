use std::sync::Arc;

use crate::auth::{CredentialStore, TokenService};
use crate::config::Config;
use crate::store::{MemoryStore, TaskStore, UserStore};

/// Everything a handler needs, built once from `Config` and shared through
/// `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: TokenService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(config: &Config, users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self {
            credentials: CredentialStore::new(users, config.bcrypt_cost),
            tasks,
            tokens: TokenService::new(&config.jwt_secret),
            secure_cookies: config.secure_cookies,
        }
    }

    /// State backed by a fresh `MemoryStore`.
    pub fn in_memory(config: &Config) -> Self {
        let store = MemoryStore::new();
        Self::new(config, Arc::new(store.clone()), Arc::new(store))
    }
}
