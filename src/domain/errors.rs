use reqwest::StatusCode;
use thiserror::Error;

pub const NETWORK_UNREACHABLE_MESSAGE: &str = "Network unreachable. Please check your connection.";

// Normalized error returned by every gateway call, whatever went wrong underneath.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    // No response was received (connect failure, reset, timeout).
    #[error("{}", NETWORK_UNREACHABLE_MESSAGE)]
    NetworkUnreachable,
    // Non-2xx response other than 401.
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    // 401 response; the gateway may already have cleared the session.
    #[error("{message}")]
    Unauthorized { message: String },
    // 2xx response whose body could not be decoded.
    #[error("malformed response body: {message}")]
    MalformedResponse { status: StatusCode, message: String },
    // The request itself could not be built (body encoding, bad URL).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    // Build the error for a non-2xx response, preferring the backend's own message.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback_message(status));

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Http { status, message }
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } | ApiError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::NetworkUnreachable | ApiError::InvalidRequest { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

fn fallback_message(status: StatusCode) -> String {
    format!("Request failed with status {}", status.as_u16())
}

// Failures of the local token storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("token storage document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("token storage lock poisoned")]
    Poisoned,
}
