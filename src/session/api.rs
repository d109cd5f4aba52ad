//! Session API
//!
//! Public entry points of the session module.

pub use crate::session::classifier::{ScanSession, ScanSessionBuilder, SessionSummary};
pub use crate::session::error::{SessionError, SessionResult};
pub use crate::session::normalize::{NormalizedId, Normalizer, NormalizerConfig};
pub use crate::session::outcome::{
    DeleteOutcome, DuplicateOrigin, FeedbackTone, ScanOutcome, UnvalidateOutcome,
};
pub use crate::session::pipeline::{PipelineExit, ScanPipeline, ScanReport};
pub use crate::session::profile::{ScanProfile, SessionMode, SCOOTER_ID_PATTERN, SCOOTER_PREFIXES};
pub use crate::session::state::{IdentifierState, ScanEntry, SessionSnapshot};
pub use crate::session::throttle::{ScanThrottle, DEFAULT_SCAN_DELAY};
