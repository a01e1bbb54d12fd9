use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Navigator, TokenStorage};
use crate::frameworks::config::Config;
use crate::interface_adapters::events::AuthEvents;
use crate::interface_adapters::gateway::ApiGateway;
use crate::interface_adapters::session::SessionStore;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::storage::FileTokenStorage;

// Wire the client with the session persisted at the configured token file.
pub fn build_state(config: &Config, navigator: Arc<dyn Navigator>) -> Result<AppState, reqwest::Error> {
    tracing::debug!(token_file = %config.token_file.display(), "session storage configured");
    let storage = Arc::new(FileTokenStorage::new(&config.token_file));
    build_state_with_storage(config, storage, navigator)
}

// Same wiring with caller-provided storage (in-memory for tests and embedders).
pub fn build_state_with_storage(
    config: &Config,
    storage: Arc<dyn TokenStorage>,
    navigator: Arc<dyn Navigator>,
) -> Result<AppState, reqwest::Error> {
    let session = SessionStore::new(storage);
    tracing::debug!(api = %config.api_base_url, "api gateway configured");
    let gateway = Arc::new(ApiGateway::new(
        config.gateway_settings(),
        session.clone(),
        navigator.clone(),
    )?);

    Ok(AppState {
        session,
        events: AuthEvents::new(),
        navigator,
        gateway,
        sign_in_lock: Arc::new(Mutex::new(())),
    })
}
