//! Ledger client trait
//!
//! The scan classifier only ever talks to the ledger through this trait, so the
//! HTTP client, the in-memory ledger and test doubles are interchangeable.

use crate::ledger::error::LedgerResult;
use crate::ledger::types::{LedgerId, LedgerReply, SessionId};

/// Request/response access to the Scan Ledger Service
///
/// Implementations never retry. A transport failure or an unreadable reply is
/// returned as `Err`; a reply the service itself tagged `error` is returned as
/// `Ok` with [`LedgerStatus::Error`](crate::ledger::types::LedgerStatus::Error).
/// Callers treat both as "not recorded".
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Record an accepted scan; replies with `total` and the new `ledger_id`
    async fn record_scan(&self, session_id: &SessionId, identifier: &str)
        -> LedgerResult<LedgerReply>;

    /// Mark an expected identifier validated; replies with `total_validated`
    async fn record_validation(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply>;

    /// Remove a previously recorded scan
    async fn delete_scan(&self, ledger_id: &LedgerId) -> LedgerResult<LedgerReply>;

    /// Revert a validation; replies with the new `total_validated`
    async fn unvalidate_scooter(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply>;
}
