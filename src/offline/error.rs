//! Offline Cache Error Types

use crate::offline::network::FetchError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Install of cache '{generation}' failed on {url}: {reason}")]
    InstallFailed {
        generation: String,
        url: String,
        reason: String,
    },

    #[error("Invalid manifest entry '{entry}': {message}")]
    InvalidManifest { entry: String, message: String },

    #[error("Cache '{generation}' has not been installed")]
    NotInstalled { generation: String },

    #[error("Cache storage unavailable: {message}")]
    Storage { message: String },
}

impl CacheError {
    pub(crate) fn install_fetch(generation: &str, url: &str, error: &FetchError) -> Self {
        CacheError::InstallFailed {
            generation: generation.to_string(),
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for CacheError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, CacheError::InvalidManifest { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            CacheError::InvalidManifest { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
