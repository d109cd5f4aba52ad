//! Scan outcomes and feedback tones

use crate::core::styles::StyleRole;
use crate::ledger::types::LedgerId;
use strum_macros::Display;

/// Who noticed the duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DuplicateOrigin {
    /// Found in local session state; no ledger call was made
    Local,
    /// Reported by the ledger, e.g. scanned by another device
    Remote,
}

/// Result of pushing one decoded string through the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Dropped by the throttle; not an error
    ThrottledDrop,
    Invalid {
        raw: String,
    },
    Duplicate {
        canonical_id: String,
        origin: DuplicateOrigin,
    },
    /// Scanned id is not on the list being validated
    NotInList {
        canonical_id: String,
    },
    Accepted {
        canonical_id: String,
        ledger_id: LedgerId,
        total: u64,
    },
    Validated {
        canonical_id: String,
        validated: u64,
        expected: u64,
    },
    /// Ledger unreachable or rejecting; local state unchanged
    Error {
        canonical_id: String,
        message: String,
    },
}

/// How an outcome is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackTone {
    Silent,
    Success,
    Info,
    Alert,
    Warning,
    Notice,
}

impl FeedbackTone {
    pub fn style(self) -> StyleRole {
        match self {
            FeedbackTone::Silent => StyleRole::Dim,
            FeedbackTone::Success => StyleRole::Success,
            FeedbackTone::Info => StyleRole::Info,
            FeedbackTone::Alert => StyleRole::Alert,
            FeedbackTone::Warning => StyleRole::Warning,
            FeedbackTone::Notice => StyleRole::Error,
        }
    }

    /// Audible confirmation, as the scan pages beep on success
    pub fn beeps(self) -> bool {
        self == FeedbackTone::Success
    }
}

impl ScanOutcome {
    pub fn tone(&self) -> FeedbackTone {
        match self {
            ScanOutcome::ThrottledDrop => FeedbackTone::Silent,
            ScanOutcome::Accepted { .. } | ScanOutcome::Validated { .. } => FeedbackTone::Success,
            ScanOutcome::Duplicate { .. } => FeedbackTone::Info,
            ScanOutcome::NotInList { .. } => FeedbackTone::Alert,
            ScanOutcome::Invalid { .. } => FeedbackTone::Warning,
            ScanOutcome::Error { .. } => FeedbackTone::Notice,
        }
    }

    /// Whether the ledger now holds this scan
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            ScanOutcome::Accepted { .. } | ScanOutcome::Validated { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            ScanOutcome::ThrottledDrop => "Scan ignored due to scan delay".to_string(),
            ScanOutcome::Invalid { raw } => format!("Invalid code: {}", raw.trim()),
            ScanOutcome::Duplicate {
                canonical_id,
                origin: DuplicateOrigin::Local,
            } => format!("ID {} already scanned", canonical_id),
            ScanOutcome::Duplicate {
                canonical_id,
                origin: DuplicateOrigin::Remote,
            } => format!("ID {} already recorded by the ledger", canonical_id),
            ScanOutcome::NotInList { canonical_id } => {
                format!("Scooter {} is not in the list", canonical_id)
            }
            ScanOutcome::Accepted {
                canonical_id,
                total,
                ..
            } => format!("ID {} saved ({} total)", canonical_id, total),
            ScanOutcome::Validated {
                canonical_id,
                validated,
                expected,
            } => format!(
                "ID {} checked in ({}/{} validated)",
                canonical_id, validated, expected
            ),
            ScanOutcome::Error {
                canonical_id,
                message,
            } => format!("ID {} not recorded, try again: {}", canonical_id, message),
        }
    }
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted {
        ledger_id: LedgerId,
        canonical_id: String,
        total: u64,
    },
    /// Ledger did not acknowledge; the entry is still listed
    Failed { ledger_id: LedgerId, message: String },
}

/// Result of an unvalidate request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnvalidateOutcome {
    Unvalidated { canonical_id: String, validated: u64 },
    /// Operator declined the confirmation
    Cancelled,
    Failed { canonical_id: String, message: String },
}
