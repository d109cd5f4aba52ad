//! In-process ledger with the service's bookkeeping rules
//!
//! Backs `--offline-ledger` dry runs and the test suites. Lists and validation
//! sessions must be opened first, as the real service creates them before a
//! scan page is ever shown.

use crate::core::sync::handle_mutex_poison;
use crate::ledger::client::LedgerClient;
use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::types::{LedgerId, LedgerReply, LedgerStatus, SessionId};
use crate::offline::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SessionBook {
    scans: Vec<(LedgerId, String)>,
    expected: HashSet<String>,
    validated: HashSet<String>,
}

#[derive(Debug, Default)]
struct LedgerBook {
    sessions: HashMap<SessionId, SessionBook>,
    owners: HashMap<LedgerId, SessionId>,
    next_id: u64,
}

/// Ledger kept in memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    book: Mutex<LedgerBook>,
    offline: AtomicBool,
    rejecting: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collect list
    pub fn open_list(&self, session_id: &SessionId) {
        if let Ok(mut book) = self.book.lock() {
            book.sessions.entry(session_id.clone()).or_default();
        }
    }

    /// Create a validation session over the given expected identifiers
    pub fn open_validation<I, S>(&self, session_id: &SessionId, expected: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut book) = self.book.lock() {
            let session = book.sessions.entry(session_id.clone()).or_default();
            session.expected.extend(expected.into_iter().map(Into::into));
        }
    }

    /// Simulate an unreachable ledger: every call fails at the transport level
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every call answer with an `error` status
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Number of calls received, including failed ones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Identifiers recorded for a session, in recording order
    pub fn recorded(&self, session_id: &SessionId) -> Vec<String> {
        self.book
            .lock()
            .ok()
            .and_then(|book| {
                book.sessions
                    .get(session_id)
                    .map(|s| s.scans.iter().map(|(_, id)| id.clone()).collect())
            })
            .unwrap_or_default()
    }

    /// Record a scan as if another device had submitted it
    pub fn record_from_other_client(&self, session_id: &SessionId, identifier: &str) {
        if let Ok(mut book) = self.lock_book() {
            let _ = Self::append_scan(&mut book, session_id, identifier);
        }
    }

    fn lock_book(&self) -> LedgerResult<MutexGuard<'_, LedgerBook>> {
        handle_mutex_poison(self.book.lock(), |message| {
            LedgerError::Transport(FetchError::Unreachable {
                url: "memory://ledger".to_string(),
                message,
            })
        })
    }

    /// Shared entry for every call: counts it and applies injected failures
    fn admit(&self, operation: &str) -> LedgerResult<Option<LedgerReply>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport(FetchError::Unreachable {
                url: format!("memory://ledger/{}", operation),
                message: "ledger offline".to_string(),
            }));
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Ok(Some(LedgerReply::status(LedgerStatus::Error)));
        }
        Ok(None)
    }

    fn append_scan(
        book: &mut LedgerBook,
        session_id: &SessionId,
        identifier: &str,
    ) -> Option<(LedgerId, u64)> {
        book.next_id += 1;
        let ledger_id = LedgerId::new(format!("scan-{}", book.next_id));
        let session = book.sessions.get_mut(session_id)?;
        session.scans.push((ledger_id.clone(), identifier.to_string()));
        let total = session.scans.len() as u64;
        book.owners.insert(ledger_id.clone(), session_id.clone());
        Some((ledger_id, total))
    }
}

#[async_trait::async_trait]
impl LedgerClient for MemoryLedger {
    async fn record_scan(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        if let Some(reply) = self.admit("record_scan")? {
            return Ok(reply);
        }
        if identifier.trim().is_empty() {
            return Ok(LedgerReply::status(LedgerStatus::Invalid));
        }

        let mut book = self.lock_book()?;
        let Some(session) = book.sessions.get(session_id) else {
            return Ok(LedgerReply::status(LedgerStatus::Error));
        };
        if session.scans.iter().any(|(_, id)| id == identifier) {
            let total = session.scans.len() as u64;
            return Ok(LedgerReply::status(LedgerStatus::Duplicate).with_total(total));
        }

        Ok(match Self::append_scan(&mut book, session_id, identifier) {
            Some((ledger_id, total)) => LedgerReply::status(LedgerStatus::Success)
                .with_total(total)
                .with_ledger_id(ledger_id),
            None => LedgerReply::status(LedgerStatus::Error),
        })
    }

    async fn record_validation(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        if let Some(reply) = self.admit("record_validation")? {
            return Ok(reply);
        }

        let mut book = self.lock_book()?;
        let Some(session) = book.sessions.get_mut(session_id) else {
            return Ok(LedgerReply::status(LedgerStatus::Error));
        };
        let status = if !session.expected.contains(identifier) {
            LedgerStatus::NotInList
        } else if !session.validated.insert(identifier.to_string()) {
            LedgerStatus::Duplicate
        } else {
            LedgerStatus::Success
        };
        Ok(LedgerReply::status(status).with_total_validated(session.validated.len() as u64))
    }

    async fn delete_scan(&self, ledger_id: &LedgerId) -> LedgerResult<LedgerReply> {
        if let Some(reply) = self.admit("delete_scan")? {
            return Ok(reply);
        }

        let mut book = self.lock_book()?;
        let Some(session_id) = book.owners.remove(ledger_id) else {
            return Ok(LedgerReply::status(LedgerStatus::Error));
        };
        let removed = book
            .sessions
            .get_mut(&session_id)
            .and_then(|session| {
                let position = session.scans.iter().position(|(id, _)| id == ledger_id)?;
                session.scans.remove(position);
                Some(session.scans.len() as u64)
            });

        Ok(match removed {
            Some(total) => LedgerReply::status(LedgerStatus::Success).with_total(total),
            None => LedgerReply::status(LedgerStatus::Error),
        })
    }

    async fn unvalidate_scooter(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        if let Some(reply) = self.admit("unvalidate_scooter")? {
            return Ok(reply);
        }

        let mut book = self.lock_book()?;
        let Some(session) = book.sessions.get_mut(session_id) else {
            return Ok(LedgerReply::status(LedgerStatus::Error));
        };
        let status = if session.validated.remove(identifier) {
            LedgerStatus::Success
        } else {
            LedgerStatus::Error
        };
        Ok(LedgerReply::status(status).with_total_validated(session.validated.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_scan_assigns_ids_and_totals() {
        let ledger = MemoryLedger::new();
        let session = SessionId::new("north_depot_1");
        ledger.open_list(&session);

        let first = ledger.record_scan(&session, "AB123").await.unwrap();
        let second = ledger.record_scan(&session, "CD456").await.unwrap();

        assert_eq!(first.total, Some(1));
        assert_eq!(second.total, Some(2));
        assert_ne!(first.ledger_id, second.ledger_id);
        assert_eq!(ledger.recorded(&session), vec!["AB123", "CD456"]);
    }

    #[tokio::test]
    async fn test_record_scan_reports_duplicates() {
        let ledger = MemoryLedger::new();
        let session = SessionId::new("s");
        ledger.open_list(&session);
        ledger.record_from_other_client(&session, "AB123");

        let reply = ledger.record_scan(&session, "AB123").await.unwrap();

        assert_eq!(reply.status, LedgerStatus::Duplicate);
        assert_eq!(reply.total, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_session_is_error_status() {
        let ledger = MemoryLedger::new();
        let reply = ledger
            .record_scan(&SessionId::new("missing"), "AB123")
            .await
            .unwrap();
        assert_eq!(reply.status, LedgerStatus::Error);
    }

    #[tokio::test]
    async fn test_validation_flow() {
        let ledger = MemoryLedger::new();
        let session = SessionId::new("v");
        ledger.open_validation(&session, ["X", "Y"]);

        let not_listed = ledger.record_validation(&session, "Z").await.unwrap();
        let first = ledger.record_validation(&session, "X").await.unwrap();
        let again = ledger.record_validation(&session, "X").await.unwrap();
        let undone = ledger.unvalidate_scooter(&session, "X").await.unwrap();

        assert_eq!(not_listed.status, LedgerStatus::NotInList);
        assert_eq!(first.status, LedgerStatus::Success);
        assert_eq!(first.total_validated, Some(1));
        assert_eq!(again.status, LedgerStatus::Duplicate);
        assert_eq!(undone.status, LedgerStatus::Success);
        assert_eq!(undone.total_validated, Some(0));
    }

    #[tokio::test]
    async fn test_delete_is_single_shot() {
        let ledger = MemoryLedger::new();
        let session = SessionId::new("s");
        ledger.open_list(&session);
        let reply = ledger.record_scan(&session, "AB123").await.unwrap();
        let ledger_id = reply.ledger_id.unwrap();

        let first = ledger.delete_scan(&ledger_id).await.unwrap();
        let second = ledger.delete_scan(&ledger_id).await.unwrap();

        assert_eq!(first.status, LedgerStatus::Success);
        assert_eq!(first.total, Some(0));
        assert_eq!(second.status, LedgerStatus::Error);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let ledger = MemoryLedger::new();
        let session = SessionId::new("s");
        ledger.open_list(&session);

        ledger.set_offline(true);
        assert!(ledger.record_scan(&session, "AB123").await.is_err());

        ledger.set_offline(false);
        ledger.set_rejecting(true);
        let reply = ledger.record_scan(&session, "AB123").await.unwrap();
        assert_eq!(reply.status, LedgerStatus::Error);

        assert_eq!(ledger.call_count(), 2);
        assert!(ledger.recorded(&session).is_empty());
    }
}
