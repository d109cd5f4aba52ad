//! Scan Session
//!
//! Throttled intake, identifier normalization and the classifier state
//! machine shared by the scooter, battery and validation flows.
//!
//! ```text
//! decoded string -> ScanThrottle -> Normalizer -> ScanSession::classify -> ScanOutcome
//!                                                        |
//!                                                  LedgerClient
//! ```

pub mod api;
pub mod classifier;
pub mod error;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod profile;
pub mod state;
pub mod throttle;

pub use classifier::{ScanSession, ScanSessionBuilder, SessionSummary};
pub use error::{SessionError, SessionResult};
pub use normalize::{NormalizedId, Normalizer, NormalizerConfig};
pub use outcome::{DeleteOutcome, DuplicateOrigin, FeedbackTone, ScanOutcome, UnvalidateOutcome};
pub use pipeline::{PipelineExit, ScanPipeline, ScanReport};
pub use profile::{ScanProfile, SessionMode};
pub use state::{IdentifierState, ScanEntry, SessionSnapshot};
pub use throttle::{ScanThrottle, DEFAULT_SCAN_DELAY};

#[cfg(test)]
mod tests;
