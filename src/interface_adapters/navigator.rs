use std::sync::Mutex;

use crate::domain::Navigator;

// Keeps every redirect target so callers (and tests) can inspect them.
#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .map(|visits| visits.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.visits().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, destination: &str) {
        tracing::debug!(%destination, "redirect recorded");
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(destination.to_string());
        }
    }
}
