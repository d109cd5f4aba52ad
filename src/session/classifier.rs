//! Scan Classifier
//!
//! [`ScanSession`] is the state machine shared by all scan flows. A decoded
//! string goes through the throttle, the normalizer and then `classify`,
//! which consults local state first and the ledger second. Local state only
//! changes after the ledger confirms, so a failed call never leaves the
//! session ahead of the server.
//!
//! The state mutex is never held across an `.await`; the in-flight set keeps a
//! second submission of the same id out while the first call is outstanding.

use crate::core::sync::handle_mutex_poison;
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::ledger::client::LedgerClient;
use crate::ledger::types::{LedgerId, LedgerReply, LedgerStatus, SessionId};
use crate::session::error::{SessionError, SessionResult};
use crate::session::normalize::{NormalizedId, Normalizer};
use crate::session::outcome::{DeleteOutcome, DuplicateOrigin, ScanOutcome, UnvalidateOutcome};
use crate::session::profile::{ScanProfile, SessionMode};
use crate::session::state::{IdentifierState, ScanEntry, SessionSnapshot, SessionState};
use crate::session::throttle::{ScanThrottle, DEFAULT_SCAN_DELAY};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Removes its id from the in-flight set when dropped
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    canonical_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight.remove(&self.canonical_id);
    }
}

struct Classified {
    outcome: ScanOutcome,
    contacted_ledger: bool,
}

impl Classified {
    fn local(outcome: ScanOutcome) -> Self {
        Self {
            outcome,
            contacted_ledger: false,
        }
    }

    fn remote(outcome: ScanOutcome) -> Self {
        Self {
            outcome,
            contacted_ledger: true,
        }
    }
}

/// Final figures of an ended session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub mode: SessionMode,
    pub total: u64,
    pub validated: u64,
    pub expected: u64,
    pub ended_at: DateTime<Local>,
}

pub struct ScanSessionBuilder {
    session_id: SessionId,
    profile: ScanProfile,
    ledger: Arc<dyn LedgerClient>,
    delay: Duration,
    clock: Arc<dyn TimeProvider>,
    expected: Vec<String>,
}

impl ScanSessionBuilder {
    /// Minimum interval between accepted scans
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    /// Identifiers to validate against; raw codes are normalized first
    pub fn expected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> SessionResult<ScanSession> {
        if self.delay.is_zero() {
            return Err(SessionError::Configuration {
                message: "Scan delay must be greater than zero".to_string(),
            });
        }

        let normalizer = Normalizer::new(self.profile.normalizer.clone());
        let expected: BTreeSet<String> = self
            .expected
            .iter()
            .map(|raw| normalizer.normalize(raw))
            .filter(|n| !n.canonical_id.is_empty())
            .map(|n| n.canonical_id)
            .collect();

        if self.profile.mode == SessionMode::Collect && !expected.is_empty() {
            return Err(SessionError::Configuration {
                message: format!(
                    "The {} profile collects scans and takes no expected list",
                    self.profile.name
                ),
            });
        }

        log::debug!(
            "Session {} ({} profile, {} mode, {} expected)",
            self.session_id,
            self.profile.name,
            self.profile.mode,
            expected.len()
        );

        let state = SessionState::new(self.session_id.clone(), self.profile.mode, expected);
        Ok(ScanSession {
            session_id: self.session_id,
            profile: self.profile,
            normalizer,
            throttle: ScanThrottle::new(self.delay),
            ledger: self.ledger,
            clock: self.clock,
            state: Mutex::new(state),
        })
    }
}

pub struct ScanSession {
    session_id: SessionId,
    profile: ScanProfile,
    normalizer: Normalizer,
    throttle: ScanThrottle,
    ledger: Arc<dyn LedgerClient>,
    clock: Arc<dyn TimeProvider>,
    state: Mutex<SessionState>,
}

impl ScanSession {
    pub fn builder(
        session_id: SessionId,
        profile: ScanProfile,
        ledger: Arc<dyn LedgerClient>,
    ) -> ScanSessionBuilder {
        ScanSessionBuilder {
            session_id,
            profile,
            ledger,
            delay: DEFAULT_SCAN_DELAY,
            clock: Arc::new(SystemTimeProvider),
            expected: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn profile(&self) -> &ScanProfile {
        &self.profile
    }

    pub fn mode(&self) -> SessionMode {
        self.profile.mode
    }

    fn lock_state(&self) -> SessionResult<MutexGuard<'_, SessionState>> {
        handle_mutex_poison(self.state.lock(), |message| SessionError::StatePoisoned {
            message,
        })
    }

    fn require_mode(&self, expected: SessionMode, operation: &str) -> SessionResult<()> {
        if self.profile.mode != expected {
            return Err(SessionError::WrongMode {
                operation: operation.to_string(),
                expected: expected.to_string(),
            });
        }
        Ok(())
    }

    /// Throttle gate against the session clock
    ///
    /// Returns the admission instant, needed to hand the slot back when the
    /// scan is settled without contacting the ledger.
    pub fn admit(&self) -> Option<Instant> {
        let now = self.clock.now();
        self.throttle.should_accept(now).then_some(now)
    }

    pub fn normalize(&self, raw: &str) -> NormalizedId {
        self.normalizer.normalize(raw)
    }

    /// Full pipeline for one decoded or typed string
    pub async fn process(&self, raw: &str) -> ScanOutcome {
        let Some(admitted_at) = self.admit() else {
            log::trace!("Scan ignored due to scan delay: {}", raw);
            return ScanOutcome::ThrottledDrop;
        };
        let normalized = self.normalize(raw);
        self.classify_admitted(&normalized, admitted_at).await
    }

    /// Classify a scan that passed the throttle at `admitted_at`
    ///
    /// Scans settled from local state alone release their throttle slot: the
    /// gate only spaces out ledger traffic.
    pub async fn classify_admitted(&self, normalized: &NormalizedId, admitted_at: Instant) -> ScanOutcome {
        let classified = self.classify_inner(normalized).await;
        if !classified.contacted_ledger {
            self.throttle.release(admitted_at);
        }
        classified.outcome
    }

    /// Decide the outcome for a normalized id, calling the ledger if needed
    pub async fn classify(&self, normalized: &NormalizedId) -> ScanOutcome {
        self.classify_inner(normalized).await.outcome
    }

    async fn classify_inner(&self, normalized: &NormalizedId) -> Classified {
        let classified = match self.profile.mode {
            SessionMode::Collect => self.classify_collect(normalized).await,
            SessionMode::Validate => self.classify_validate(normalized).await,
        };
        log::debug!(
            "{} '{}' -> {:?}",
            self.session_id,
            normalized.canonical_id,
            classified.outcome
        );
        classified
    }

    fn error_outcome(canonical_id: &str, message: impl Into<String>) -> ScanOutcome {
        ScanOutcome::Error {
            canonical_id: canonical_id.to_string(),
            message: message.into(),
        }
    }

    /// Outcome decided by local state alone, or `None` when the ledger must be asked
    fn local_verdict(&self, state: &SessionState, normalized: &NormalizedId) -> SessionResult<Option<ScanOutcome>> {
        if state.ended {
            return Err(SessionError::Ended);
        }
        let id = normalized.canonical_id.as_str();
        let invalid = || ScanOutcome::Invalid {
            raw: normalized.raw.clone(),
        };
        let duplicate = || ScanOutcome::Duplicate {
            canonical_id: id.to_string(),
            origin: DuplicateOrigin::Local,
        };

        let verdict = match self.profile.mode {
            SessionMode::Collect => {
                if state.is_accepted(id) || state.in_flight.contains(id) {
                    Some(duplicate())
                } else if !normalized.valid {
                    Some(invalid())
                } else {
                    None
                }
            }
            // Membership first, then validity
            SessionMode::Validate => {
                if id.is_empty() {
                    Some(invalid())
                } else if !state.expected.contains(id) {
                    Some(ScanOutcome::NotInList {
                        canonical_id: id.to_string(),
                    })
                } else if !normalized.valid {
                    Some(invalid())
                } else if state.validated.contains(id) || state.in_flight.contains(id) {
                    Some(duplicate())
                } else {
                    None
                }
            }
        };
        Ok(verdict)
    }

    /// Local checks; claims the id as in flight when a ledger call is due
    fn precheck(&self, normalized: &NormalizedId) -> SessionResult<Result<InFlightGuard<'_>, ScanOutcome>> {
        let mut state = self.lock_state()?;
        if let Some(outcome) = self.local_verdict(&state, normalized)? {
            return Ok(Err(outcome));
        }
        let id = normalized.canonical_id.clone();
        state.in_flight.insert(id.clone());
        Ok(Ok(InFlightGuard {
            state: &self.state,
            canonical_id: id,
        }))
    }

    /// Settle an admitted scan without the ledger when local state decides it
    ///
    /// The throttle slot is handed back before returning, so the next scan
    /// sees it released. `None` means the scan needs [`Self::classify_admitted`].
    pub fn settle_locally(&self, normalized: &NormalizedId, admitted_at: Instant) -> Option<ScanOutcome> {
        let verdict = match self.lock_state() {
            Ok(state) => self.local_verdict(&state, normalized),
            Err(e) => Err(e),
        };
        let outcome = match verdict {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return None,
            Err(e) => Self::error_outcome(&normalized.canonical_id, e.to_string()),
        };
        self.throttle.release(admitted_at);
        log::debug!(
            "{} '{}' -> {:?}",
            self.session_id,
            normalized.canonical_id,
            outcome
        );
        Some(outcome)
    }

    async fn classify_collect(&self, normalized: &NormalizedId) -> Classified {
        let id = normalized.canonical_id.as_str();
        let _guard = match self.precheck(normalized) {
            Ok(Ok(guard)) => guard,
            Ok(Err(outcome)) => return Classified::local(outcome),
            Err(e) => return Classified::local(Self::error_outcome(id, e.to_string())),
        };

        let reply = match self.ledger.record_scan(&self.session_id, id).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("record_scan for '{}' failed: {}", id, e);
                return Classified::remote(Self::error_outcome(id, e.to_string()));
            }
        };

        let outcome = match reply.status {
            LedgerStatus::Success => self.accept(normalized, reply),
            LedgerStatus::Duplicate => ScanOutcome::Duplicate {
                canonical_id: id.to_string(),
                origin: DuplicateOrigin::Remote,
            },
            LedgerStatus::Invalid => ScanOutcome::Invalid {
                raw: normalized.raw.clone(),
            },
            status => {
                log::warn!("record_scan for '{}' answered {}", id, status);
                Self::error_outcome(id, format!("ledger answered {}", status))
            }
        };
        Classified::remote(outcome)
    }

    fn accept(&self, normalized: &NormalizedId, reply: LedgerReply) -> ScanOutcome {
        let id = normalized.canonical_id.as_str();
        let Some(ledger_id) = reply.ledger_id else {
            return Self::error_outcome(id, "ledger accepted the scan without an id");
        };
        let entry = ScanEntry {
            raw: normalized.raw.clone(),
            canonical_id: id.to_string(),
            ledger_id: ledger_id.clone(),
            accepted_at: DateTime::<Local>::from(self.clock.system_time()),
        };

        match self.lock_state() {
            Ok(mut state) => {
                state.append(entry, reply.total);
                ScanOutcome::Accepted {
                    canonical_id: id.to_string(),
                    ledger_id,
                    total: state.total,
                }
            }
            Err(e) => Self::error_outcome(id, e.to_string()),
        }
    }

    async fn classify_validate(&self, normalized: &NormalizedId) -> Classified {
        let id = normalized.canonical_id.as_str();
        let _guard = match self.precheck(normalized) {
            Ok(Ok(guard)) => guard,
            Ok(Err(outcome)) => return Classified::local(outcome),
            Err(e) => return Classified::local(Self::error_outcome(id, e.to_string())),
        };

        let reply = match self.ledger.record_validation(&self.session_id, id).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("record_validation for '{}' failed: {}", id, e);
                return Classified::remote(Self::error_outcome(id, e.to_string()));
            }
        };

        let outcome = match reply.status {
            LedgerStatus::Success => match self.lock_state() {
                Ok(mut state) => {
                    state.mark_validated(id, reply.total_validated);
                    ScanOutcome::Validated {
                        canonical_id: id.to_string(),
                        validated: state.validated_count,
                        expected: state.expected.len() as u64,
                    }
                }
                Err(e) => Self::error_outcome(id, e.to_string()),
            },
            LedgerStatus::Duplicate => ScanOutcome::Duplicate {
                canonical_id: id.to_string(),
                origin: DuplicateOrigin::Remote,
            },
            LedgerStatus::NotInList => ScanOutcome::NotInList {
                canonical_id: id.to_string(),
            },
            LedgerStatus::Invalid => ScanOutcome::Invalid {
                raw: normalized.raw.clone(),
            },
            LedgerStatus::Error => {
                log::warn!("record_validation for '{}' answered error", id);
                Self::error_outcome(id, "ledger answered error")
            }
        };
        Classified::remote(outcome)
    }

    /// Remove one accepted scan once the ledger confirms the deletion
    pub async fn delete_scan(&self, ledger_id: &LedgerId) -> SessionResult<DeleteOutcome> {
        self.require_mode(SessionMode::Collect, "delete")?;
        let canonical_id = {
            let state = self.lock_state()?;
            state
                .find_entry(ledger_id)
                .map(|entry| entry.canonical_id.clone())
                .ok_or_else(|| SessionError::UnknownEntry {
                    ledger_id: ledger_id.to_string(),
                })?
        };

        let failure = match self.ledger.delete_scan(ledger_id).await {
            Ok(reply) if reply.is_success() => None,
            Ok(reply) => Some(format!("ledger answered {}", reply.status)),
            Err(e) => Some(e.to_string()),
        };
        if let Some(message) = failure {
            log::warn!("delete_scan {} failed: {}", ledger_id, message);
            return Ok(DeleteOutcome::Failed {
                ledger_id: ledger_id.clone(),
                message,
            });
        }

        let mut state = self.lock_state()?;
        match state.remove(ledger_id) {
            Some(_) => Ok(DeleteOutcome::Deleted {
                ledger_id: ledger_id.clone(),
                canonical_id,
                total: state.total,
            }),
            // Deleted concurrently while the call was out
            None => Err(SessionError::UnknownEntry {
                ledger_id: ledger_id.to_string(),
            }),
        }
    }

    /// Revert a validated id after confirmation and a successful ledger round trip
    ///
    /// `confirm` receives the canonical id and is only asked once the id is
    /// known to be validated.
    pub async fn unvalidate<F>(&self, identifier: &str, confirm: F) -> SessionResult<UnvalidateOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        self.require_mode(SessionMode::Validate, "unvalidate")?;
        let canonical_id = self.normalize(identifier).canonical_id;

        {
            let state = self.lock_state()?;
            if state.in_flight.contains(&canonical_id) {
                return Err(SessionError::InFlight {
                    identifier: canonical_id,
                });
            }
            if state.identifier_state(&canonical_id) != IdentifierState::Validated {
                return Err(SessionError::NotValidated {
                    identifier: canonical_id,
                });
            }
        }

        if !confirm(&canonical_id) {
            log::debug!("Unvalidate of '{}' cancelled", canonical_id);
            return Ok(UnvalidateOutcome::Cancelled);
        }

        let _guard = {
            let mut state = self.lock_state()?;
            if !state.in_flight.insert(canonical_id.clone()) {
                return Err(SessionError::InFlight {
                    identifier: canonical_id,
                });
            }
            InFlightGuard {
                state: &self.state,
                canonical_id: canonical_id.clone(),
            }
        };

        let reply = self
            .ledger
            .unvalidate_scooter(&self.session_id, &canonical_id)
            .await;
        let reply = match reply {
            Ok(reply) if reply.is_success() => reply,
            Ok(reply) => {
                return Ok(UnvalidateOutcome::Failed {
                    canonical_id,
                    message: format!("ledger answered {}", reply.status),
                })
            }
            Err(e) => {
                log::warn!("unvalidate_scooter for '{}' failed: {}", canonical_id, e);
                return Ok(UnvalidateOutcome::Failed {
                    canonical_id,
                    message: e.to_string(),
                });
            }
        };

        let mut state = self.lock_state()?;
        state.unmark_validated(&canonical_id, reply.total_validated);
        Ok(UnvalidateOutcome::Unvalidated {
            canonical_id,
            validated: state.validated_count,
        })
    }

    pub fn identifier_state(&self, identifier: &str) -> SessionResult<IdentifierState> {
        let canonical_id = self.normalize(identifier).canonical_id;
        Ok(self.lock_state()?.identifier_state(&canonical_id))
    }

    pub fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        Ok(self.lock_state()?.snapshot())
    }

    /// Number of ledger calls still outstanding
    pub fn in_flight(&self) -> SessionResult<usize> {
        Ok(self.lock_state()?.in_flight.len())
    }

    /// End the session: further scans are refused and the throttle is reset
    pub fn end(&self) -> SessionResult<SessionSummary> {
        let mut state = self.lock_state()?;
        state.ended = true;
        self.throttle.reset();
        let summary = SessionSummary {
            session_id: self.session_id.clone(),
            mode: self.profile.mode,
            total: state.total,
            validated: state.validated_count,
            expected: state.expected.len() as u64,
            ended_at: DateTime::<Local>::from(self.clock.system_time()),
        };
        log::info!(
            "Session {} ended: {} scans, {}/{} validated",
            summary.session_id,
            summary.total,
            summary.validated,
            summary.expected
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;

    #[test]
    fn test_poisoned_state_is_reported() {
        let ledger = Arc::new(MemoryLedger::new());
        let session = Arc::new(
            ScanSession::builder(SessionId::new("s-1"), ScanProfile::battery(), ledger)
                .build()
                .unwrap(),
        );
        assert_eq!(session.in_flight().unwrap(), 0);

        let poisoner = Arc::clone(&session);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.lock().unwrap();
            panic!("holder died");
        })
        .join();

        assert!(matches!(session.in_flight(), Err(SessionError::StatePoisoned { .. })));
        assert!(session.snapshot().is_err());
    }
}
