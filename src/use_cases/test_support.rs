use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::{
    ApiError, PaymentStatus, PaymentStatusSource, ProfileSource, StorageError, TokenStorage,
    UserProfile,
};

pub(crate) fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: "a@b.com".to_string(),
        name: Some("Ada".to_string()),
        role: None,
    }
}

// Storage whose every operation fails, for exercising error paths.
pub(crate) struct FailingStorage;

impl TokenStorage for FailingStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Poisoned)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Poisoned)
    }

    fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Poisoned)
    }
}

// Profile source that replays scripted results, then reports the network as down.
pub(crate) struct ScriptedProfiles {
    results: Mutex<VecDeque<Result<UserProfile, ApiError>>>,
    calls: AtomicUsize,
}

impl ScriptedProfiles {
    pub(crate) fn new(results: Vec<Result<UserProfile, ApiError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileSource for ScriptedProfiles {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.results.lock().expect("results mutex poisoned");
        guard.pop_front().unwrap_or(Err(ApiError::NetworkUnreachable))
    }
}

// Payment source that replays scripted statuses, then stays pending.
pub(crate) struct ScriptedPayments {
    statuses: Mutex<VecDeque<Result<PaymentStatus, ApiError>>>,
    calls: AtomicUsize,
}

impl ScriptedPayments {
    pub(crate) fn new(statuses: Vec<Result<PaymentStatus, ApiError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentStatusSource for ScriptedPayments {
    async fn payment_status(&self, _order_id: &str) -> Result<PaymentStatus, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.statuses.lock().expect("statuses mutex poisoned");
        guard.pop_front().unwrap_or(Ok(PaymentStatus::Pending))
    }
}
