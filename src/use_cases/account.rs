use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{ApiError, AuthSession, ProfileSource, StorageError, UserProfile};
use crate::interface_adapters::events::AuthEvents;
use crate::interface_adapters::gateway::{ApiGateway, RequestOptions, UnauthorizedPolicy};
use crate::interface_adapters::protocol::{LoginRequest, RegisterRequest};
use crate::interface_adapters::session::SessionStore;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not persist session: {0}")]
    Storage(#[from] StorageError),
}

// Login, registration and logout: the only places that mutate the session and broadcast.
#[derive(Clone)]
pub struct AccountUseCase {
    pub gateway: Arc<ApiGateway>,
    pub session: SessionStore,
    pub events: AuthEvents,
    // Held across the request and the token write so sign-ins never interleave.
    pub sign_in_lock: Arc<Mutex<()>>,
}

// Sign-in endpoints take no credential, and a 401 there means "bad credentials",
// not "session expired", so the caller stays where it is.
fn sign_in_options() -> RequestOptions {
    RequestOptions::public().unauthorized(UnauthorizedPolicy::Propagate)
}

impl AccountUseCase {
    #[tracing::instrument(name = "login", skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AccountError> {
        let _guard = self.sign_in_lock.lock().await;
        let auth: AuthSession = self
            .gateway
            .post("/auth/login", &LoginRequest { email, password }, sign_in_options())
            .await?;

        self.establish(&auth)?;
        tracing::info!("signed in");
        Ok(auth)
    }

    #[tracing::instrument(name = "register", skip_all, fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AccountError> {
        let _guard = self.sign_in_lock.lock().await;
        let auth: AuthSession = self
            .gateway
            .post(
                "/auth/register",
                &RegisterRequest {
                    name,
                    email,
                    password,
                },
                sign_in_options(),
            )
            .await?;

        self.establish(&auth)?;
        tracing::info!("account registered");
        Ok(auth)
    }

    pub fn logout(&self) -> Result<(), AccountError> {
        self.session.remove_token()?;
        self.events.publish();
        tracing::info!("signed out");
        Ok(())
    }

    // Profile fetch with the default policy: a rejected session forces re-login.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.gateway
            .get("/auth/profile", RequestOptions::default())
            .await
    }

    fn establish(&self, auth: &AuthSession) -> Result<(), AccountError> {
        self.session.set_token(&auth.token)?;
        self.events.publish();
        Ok(())
    }
}

// Background profile checks clear a rejected token but never yank the user away.
#[async_trait]
impl ProfileSource for AccountUseCase {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.gateway
            .get(
                "/auth/profile",
                RequestOptions::default().unauthorized(UnauthorizedPolicy::ClearSession),
            )
            .await
    }
}
