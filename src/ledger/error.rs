//! Ledger Error Types

use crate::offline::FetchError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger unreachable: {0}")]
    Transport(#[from] FetchError),

    #[error("Ledger answered HTTP {status} for {operation}")]
    Http { operation: String, status: u16 },

    #[error("Malformed ledger reply for {operation}: {message}")]
    Malformed { operation: String, message: String },
}

impl crate::core::error_handling::ContextualError for LedgerError {
    fn is_user_actionable(&self) -> bool {
        false // Operator can only retry by rescanning
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
