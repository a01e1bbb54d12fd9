use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::Navigator;
use crate::interface_adapters::events::AuthEvents;
use crate::interface_adapters::gateway::ApiGateway;
use crate::interface_adapters::session::SessionStore;
use crate::use_cases::account::AccountUseCase;
use crate::use_cases::catalog::CatalogUseCase;
use crate::use_cases::checkout::CheckoutUseCase;
use crate::use_cases::custom_files::CustomFilesUseCase;

// Shared handles for one running client. Every clone points at the same session.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionStore,
    pub events: AuthEvents,
    // Arc<dyn Trait> so the CLI, embedders and tests can pick their own navigator.
    pub navigator: Arc<dyn Navigator>,
    pub gateway: Arc<ApiGateway>,
    // Shared by every account handle so sign-ins are sequenced client-wide.
    pub sign_in_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn account(&self) -> AccountUseCase {
        AccountUseCase {
            gateway: self.gateway.clone(),
            session: self.session.clone(),
            events: self.events.clone(),
            sign_in_lock: self.sign_in_lock.clone(),
        }
    }

    pub fn catalog(&self) -> CatalogUseCase {
        CatalogUseCase {
            gateway: self.gateway.clone(),
        }
    }

    pub fn checkout(&self) -> CheckoutUseCase {
        CheckoutUseCase {
            gateway: self.gateway.clone(),
            navigator: self.navigator.clone(),
        }
    }

    pub fn custom_files(&self) -> CustomFilesUseCase {
        CustomFilesUseCase {
            gateway: self.gateway.clone(),
        }
    }
}
