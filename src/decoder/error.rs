//! Decoder Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to read scan input: {message}")]
    Io { message: String },

    #[error("Decoder is stopped")]
    Stopped,

    #[error("Scan input closed")]
    Closed,
}

impl From<std::io::Error> for DecoderError {
    fn from(error: std::io::Error) -> Self {
        DecoderError::Io {
            message: error.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for DecoderError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, DecoderError::Io { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            DecoderError::Io { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for decoder operations
pub type DecoderResult<T> = Result<T, DecoderError>;
