//! Generic error handling utilities
//!
//! Every domain error (decoder, session, ledger, cache, config) implements
//! [`ContextualError`] so the command layer can decide whether to show the
//! operator a specific message or a generic notice with details in the log.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if the operator can fix this error themselves
    /// (bad configuration, malformed manual entry, unknown session).
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with the detail level appropriate to its kind
///
/// User-actionable errors log their own message; system errors log the
/// operation context. Full details always go to debug level.
///
/// # Examples
/// ```rust,no_run
/// # use fieldscan::core::error_handling::log_error_with_context;
/// # use fieldscan::app::config::ConfigError;
/// let err = ConfigError::Invalid { message: "scan delay must be positive".to_string() };
/// log_error_with_context(&err, "Loading configuration");
/// // Logs: "FATAL: scan delay must be positive"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Log a non-fatal error as a warning, keeping the session alive
pub fn log_recoverable<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::warn!("{}: {}", operation_context, user_msg)
        }
        _ => log::warn!("{} failed, local state unchanged", operation_context),
    }
    log::debug!("DETAIL: {}", error);
}
