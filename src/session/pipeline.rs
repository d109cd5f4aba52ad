//! Scan pipeline
//!
//! Connects a [`DecoderAdapter`] to a [`ScanSession`]. The throttle decision
//! and local classification happen in arrival order on the reading task;
//! ledger calls run in spawned tasks so a slow ledger never stalls decoding. Outcomes are reported
//! on a channel in completion order.
//!
//! Pausing the decoder leaves spawned tasks alone; they finish and still
//! apply their results to the session.

use crate::decoder::adapter::DecoderAdapter;
use crate::decoder::error::DecoderResult;
use crate::decoder::traits::DecodedEvent;
use crate::session::classifier::ScanSession;
use crate::session::outcome::ScanOutcome;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

/// One decoded input and what became of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub event: DecodedEvent,
    pub outcome: ScanOutcome,
}

/// Why [`ScanPipeline::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineExit {
    InputEnded,
    Shutdown,
}

pub struct ScanPipeline {
    session: Arc<ScanSession>,
    tasks: JoinSet<()>,
    reports: mpsc::UnboundedSender<ScanReport>,
}

impl ScanPipeline {
    pub fn new(session: Arc<ScanSession>) -> (Self, mpsc::UnboundedReceiver<ScanReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        (
            Self {
                session,
                tasks: JoinSet::new(),
                reports,
            },
            rx,
        )
    }

    pub fn session(&self) -> &Arc<ScanSession> {
        &self.session
    }

    /// Tasks spawned and not yet reaped
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    fn report(&self, event: DecodedEvent, outcome: ScanOutcome) {
        // Nobody listening is fine; the session state is what counts
        let _ = self.reports.send(ScanReport { event, outcome });
    }

    /// Feed one decoded input
    ///
    /// Scans decided by local state settle here, releasing their throttle
    /// slot before the next input is admitted. Only ledger work is spawned.
    pub fn submit(&mut self, event: DecodedEvent) {
        let Some(admitted_at) = self.session.admit() else {
            log::trace!("Scan ignored due to scan delay: {}", event.data);
            self.report(event, ScanOutcome::ThrottledDrop);
            return;
        };

        let normalized = self.session.normalize(&event.data);
        if let Some(outcome) = self.session.settle_locally(&normalized, admitted_at) {
            self.report(event, outcome);
            return;
        }

        let session = Arc::clone(&self.session);
        let reports = self.reports.clone();
        self.tasks.spawn(async move {
            let outcome = session.classify_admitted(&normalized, admitted_at).await;
            let _ = reports.send(ScanReport { event, outcome });
        });
    }

    fn reap(&self, result: Result<(), tokio::task::JoinError>) {
        if let Err(e) = result {
            log::error!("Scan task failed: {}", e);
        }
    }

    /// Read decoded input until it ends or shutdown is signalled
    pub async fn run(
        &mut self,
        adapter: &mut DecoderAdapter,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> DecoderResult<PipelineExit> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    log::debug!("Shutdown requested, leaving scan loop");
                    return Ok(PipelineExit::Shutdown);
                }
                Some(result) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.reap(result);
                }
                event = adapter.next() => {
                    match event? {
                        Some(event) => self.submit(event),
                        None => return Ok(PipelineExit::InputEnded),
                    }
                }
            }
        }
    }

    /// Wait for every outstanding ledger call to finish
    pub async fn drain(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!("Waiting for {} in-flight scans", self.tasks.len());
        }
        while let Some(result) = self.tasks.join_next().await {
            self.reap(result);
        }
    }
}
