use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

// Well-known name of the auth-change channel, used in logs.
pub const AUTH_CHANGED_CHANNEL: &str = "auth-change";

const DEFAULT_CAPACITY: usize = 16;

// Zero-payload signal: "authentication status may have changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthChanged;

// Process-wide fan-out of auth changes. No history: late subscribers see nothing past.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthChanged>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    // Notify every current subscriber; returns how many were reached.
    pub fn publish(&self) -> usize {
        let reached = self.tx.send(AuthChanged).unwrap_or(0);
        tracing::debug!(channel = AUTH_CHANGED_CHANNEL, reached, "auth change published");
        reached
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// Scoped subscription; dropping it unsubscribes.
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthChanged>,
}

impl AuthSubscription {
    // Wait for the next change. Returns false once the channel is gone.
    pub async fn changed(&mut self) -> bool {
        match self.rx.recv().await {
            Ok(AuthChanged) => true,
            Err(RecvError::Lagged(missed)) => {
                // Missed signals carry no payload, so one re-check covers them all.
                tracing::warn!(missed, "auth change subscriber lagged; collapsing notifications");
                true
            }
            Err(RecvError::Closed) => false,
        }
    }

    // Non-blocking check for a pending change.
    pub fn try_changed(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(AuthChanged) | Err(TryRecvError::Lagged(_)) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
        }
    }
}
