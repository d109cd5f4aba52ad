//! Shared fixtures for session tests

use crate::core::time::MockTimeProvider;
use crate::ledger::api::{LedgerClient, LedgerId, LedgerReply, LedgerResult, MemoryLedger, SessionId};
use crate::session::api::{Normalizer, ScanOutcome, ScanProfile, ScanSession};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub(super) struct Fixture {
    pub(super) session: Arc<ScanSession>,
    pub(super) ledger: Arc<MemoryLedger>,
    pub(super) clock: MockTimeProvider,
}

impl Fixture {
    /// Scan at `millis` after the fixture was created
    pub(super) async fn scan_at(&self, millis: u64, raw: &str) -> ScanOutcome {
        self.clock.set_elapsed_millis(millis);
        self.session.process(raw).await
    }
}

fn build(profile: ScanProfile, ledger: Arc<MemoryLedger>, expected: &[&str]) -> Fixture {
    let clock = MockTimeProvider::new();
    let session = ScanSession::builder(SessionId::new("s-1"), profile, ledger.clone())
        .clock(Arc::new(clock.clone()))
        .expected(expected.iter().copied())
        .build()
        .unwrap();
    Fixture {
        session: Arc::new(session),
        ledger,
        clock,
    }
}

pub(super) fn collect(profile: ScanProfile) -> Fixture {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.open_list(&SessionId::new("s-1"));
    build(profile, ledger, &[])
}

/// The ledger holds the short ids, as the service stores them
pub(super) fn validate(expected: &[&str]) -> Fixture {
    validate_with(ScanProfile::validate(), expected)
}

pub(super) fn validate_with(profile: ScanProfile, expected: &[&str]) -> Fixture {
    let normalizer = Normalizer::new(profile.normalizer.clone());
    let ledger = Arc::new(MemoryLedger::new());
    ledger.open_validation(
        &SessionId::new("s-1"),
        expected.iter().map(|raw| normalizer.normalize(raw).canonical_id),
    );
    build(profile, ledger, expected)
}

/// Ledger whose calls wait for a permit before reaching the inner ledger
pub(super) struct GatedLedger {
    pub(super) inner: MemoryLedger,
    pub(super) gate: Semaphore,
}

impl GatedLedger {
    pub(super) fn closed() -> Self {
        Self {
            inner: MemoryLedger::new(),
            gate: Semaphore::new(0),
        }
    }

    async fn pass(&self) {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait::async_trait]
impl LedgerClient for GatedLedger {
    async fn record_scan(&self, session_id: &SessionId, identifier: &str) -> LedgerResult<LedgerReply> {
        self.pass().await;
        self.inner.record_scan(session_id, identifier).await
    }

    async fn record_validation(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        self.pass().await;
        self.inner.record_validation(session_id, identifier).await
    }

    async fn delete_scan(&self, ledger_id: &LedgerId) -> LedgerResult<LedgerReply> {
        self.pass().await;
        self.inner.delete_scan(ledger_id).await
    }

    async fn unvalidate_scooter(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        self.pass().await;
        self.inner.unvalidate_scooter(session_id, identifier).await
    }
}
