use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{ProfileSource, UserProfile};
use crate::interface_adapters::events::AuthEvents;
use crate::interface_adapters::session::SessionStore;

// What an auth-dependent view (nav bar, profile widget) should display.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    SignedOut,
    SignedIn(UserProfile),
    // A token is stored but the profile could not be fetched (network, 5xx, ...).
    Unavailable(String),
}

impl AuthStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthStatus::SignedIn(_))
    }
}

// Local presence check first; only a stored token is worth a profile round-trip.
pub async fn resolve_auth_status<P>(session: &SessionStore, profiles: &P) -> AuthStatus
where
    P: ProfileSource + ?Sized,
{
    if !session.is_authenticated() {
        return AuthStatus::SignedOut;
    }

    match profiles.fetch_profile().await {
        Ok(profile) => AuthStatus::SignedIn(profile),
        Err(error) if error.is_unauthorized() => AuthStatus::SignedOut,
        Err(error) => AuthStatus::Unavailable(error.message()),
    }
}

// A stored token the backend rejected is cleared by the profile fetch; announce that
// so other mounted views drop their signed-in state too. Only a token that was present
// before the check can trigger this, so the re-derive it causes never announces again.
async fn derive_and_announce(
    session: &SessionStore,
    events: &AuthEvents,
    profiles: &dyn ProfileSource,
) -> AuthStatus {
    let had_token = session.is_authenticated();
    let status = resolve_auth_status(session, profiles).await;
    if had_token && status == AuthStatus::SignedOut && !session.is_authenticated() {
        tracing::info!("stored session rejected; announcing sign-out");
        events.publish();
    }
    status
}

// A mounted auth-dependent view. Subscribes on mount, re-derives its status on every
// auth change, and releases the subscription on unmount or drop.
pub struct AuthStateWatcher {
    status: watch::Receiver<AuthStatus>,
    task: JoinHandle<()>,
}

impl AuthStateWatcher {
    pub async fn mount(
        session: SessionStore,
        events: &AuthEvents,
        profiles: Arc<dyn ProfileSource>,
    ) -> Self {
        // Subscribe before the first check so a change racing the mount is not lost.
        let mut subscription = events.subscribe();
        let initial = derive_and_announce(&session, events, profiles.as_ref()).await;
        let (status_tx, status) = watch::channel(initial);

        let events = events.clone();
        let task = tokio::spawn(async move {
            while subscription.changed().await {
                let next = derive_and_announce(&session, &events, profiles.as_ref()).await;
                tracing::debug!(signed_in = next.is_signed_in(), "auth status re-derived");
                if status_tx.send(next).is_err() {
                    break;
                }
            }
        });

        Self { status, task }
    }

    pub fn status(&self) -> AuthStatus {
        self.status.borrow().clone()
    }

    // Receiver that wakes on every re-derived status.
    pub fn updates(&self) -> watch::Receiver<AuthStatus> {
        self.status.clone()
    }

    // Stop listening and wait until the subscription is released.
    pub async fn unmount(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for AuthStateWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
