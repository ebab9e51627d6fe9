use std::sync::Arc;

use waypoint_auth::jwt::TokenService;
use waypoint_storage::objects::ObjectStore;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub tokens: Arc<TokenService>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, tokens: TokenService, max_upload_bytes: usize) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            max_upload_bytes,
        }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }
}
