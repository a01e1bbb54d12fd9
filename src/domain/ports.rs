use async_trait::async_trait;

use crate::domain::entities::{PaymentStatus, UserProfile};
use crate::domain::errors::{ApiError, StorageError};

// Port for client-local persistent key/value storage holding the session token.
pub trait TokenStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    // Deleting a key that does not exist is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

// Port for moving the user to another place (login entry point, payment provider).
pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}

// Port used by auth-dependent views to check who is signed in.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError>;
}

// Port used by the payment poller.
#[async_trait]
pub trait PaymentStatusSource: Send + Sync {
    async fn payment_status(&self, order_id: &str) -> Result<PaymentStatus, ApiError>;
}
