//! Session Error Types
//!
//! Scan outcomes (duplicate, invalid, not in list, ledger failure) are not
//! errors; they are reported as [`ScanOutcome`](crate::session::ScanOutcome)
//! values. These variants cover misuse of the session API and broken state.

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Session state unavailable: {message}")]
    StatePoisoned { message: String },

    #[error("'{operation}' is only available in {expected} mode")]
    WrongMode { operation: String, expected: String },

    #[error("No scan with ledger id '{ledger_id}' in this session")]
    UnknownEntry { ledger_id: String },

    #[error("'{identifier}' is not validated in this session")]
    NotValidated { identifier: String },

    #[error("A ledger call for '{identifier}' is already in flight")]
    InFlight { identifier: String },

    #[error("Invalid session configuration: {message}")]
    Configuration { message: String },

    #[error("Session has ended")]
    Ended,
}

impl crate::core::error_handling::ContextualError for SessionError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, SessionError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SessionError::Configuration { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
