//! Session run loops
//!
//! Interactive mode feeds typed ids into a [`ChannelDecoder`] and handles
//! `:` commands on the same input. Replay mode reads a file through a paced
//! [`LineDecoder`]. Both hand decoded events to a [`ScanPipeline`] running in
//! its own task, so command handling never blocks decoding.

use crate::app::commands::{parse_line, InputLine, SessionCommand, HELP_TEXT};
use crate::app::display;
use crate::core::error_handling::log_recoverable;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::styles::StyleRole;
use crate::decoder::adapter::{DecoderAdapter, DecoderControl};
use crate::decoder::channel::{ChannelDecoder, FrameSender};
use crate::decoder::error::DecoderResult;
use crate::decoder::lines::LineDecoder;
use crate::decoder::traits::{ScanDecoder, ScanSource};
use crate::ledger::types::LedgerId;
use crate::session::classifier::{ScanSession, SessionSummary};
use crate::session::error::SessionResult;
use crate::session::pipeline::{PipelineExit, ScanPipeline, ScanReport};
use crate::session::state::IdentifierState;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct PipelineTask {
    control: DecoderControl,
    reports: mpsc::UnboundedReceiver<ScanReport>,
    handle: JoinHandle<DecoderResult<PipelineExit>>,
}

/// Everything a run loop needs besides its input
pub struct SessionRunner {
    session: Arc<ScanSession>,
    use_color: bool,
}

impl SessionRunner {
    pub fn new(session: Arc<ScanSession>, use_color: bool) -> Self {
        Self { session, use_color }
    }

    pub fn session(&self) -> &Arc<ScanSession> {
        &self.session
    }

    fn say(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }

    fn say_styled(&self, text: &str, role: StyleRole) {
        self.say(&role.paint(text, self.use_color));
    }

    fn print_report(&self, report: &ScanReport) {
        if let Some(line) = display::outcome_line(&report.event, &report.outcome, self.use_color) {
            self.say(&line);
        }
    }

    /// Start the decoder and run the pipeline in its own task
    ///
    /// The task ends when input ends or shutdown is signalled, after every
    /// in-flight ledger call has finished.
    async fn spawn_pipeline(
        &self,
        decoder: Box<dyn ScanDecoder>,
        coordinator: &ShutdownCoordinator,
    ) -> DecoderResult<PipelineTask> {
        let (mut adapter, control) = DecoderAdapter::new(decoder);
        adapter.start().await?;
        let (mut pipeline, reports) = ScanPipeline::new(Arc::clone(&self.session));
        let mut shutdown = coordinator.subscribe();

        let handle = tokio::spawn(async move {
            let exit = pipeline.run(&mut adapter, &mut shutdown).await;
            pipeline.drain().await;
            if let Err(e) = adapter.shutdown().await {
                log::debug!("Decoder shutdown: {}", e);
            }
            exit
        });
        Ok(PipelineTask {
            control,
            reports,
            handle,
        })
    }

    async fn finish(&self, handle: JoinHandle<DecoderResult<PipelineExit>>) -> SessionResult<SessionSummary> {
        match handle.await {
            Ok(Ok(exit)) => log::debug!("Scan loop ended: {:?}", exit),
            Ok(Err(e)) => log_recoverable(&e, "Reading scans"),
            Err(e) => log::error!("Scan loop task failed: {}", e),
        }
        let summary = self.session.end()?;
        self.say(&display::summary_line(&summary));
        Ok(summary)
    }

    /// Replay recorded scans from a file, spaced by `pace`
    pub async fn replay(
        &self,
        path: &Path,
        pace: Duration,
        coordinator: &ShutdownCoordinator,
    ) -> Result<SessionSummary, Box<dyn std::error::Error>> {
        let file = tokio::fs::File::open(path).await?;
        log::info!("Replaying scans from {}", path.display());
        let decoder = LineDecoder::new(BufReader::new(file), ScanSource::Camera).with_pace(pace);

        let mut task = self.spawn_pipeline(Box::new(decoder), coordinator).await?;
        while let Some(report) = task.reports.recv().await {
            self.print_report(&report);
        }
        Ok(self.finish(task.handle).await?)
    }

    /// Interactive session on the given input
    pub async fn interactive<R>(
        &self,
        input: R,
        coordinator: &ShutdownCoordinator,
    ) -> Result<SessionSummary, Box<dyn std::error::Error>>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (decoder, frames) = ChannelDecoder::new(ScanSource::Manual);
        let PipelineTask {
            control,
            mut reports,
            handle,
        } = self.spawn_pipeline(Box::new(decoder), coordinator).await?;
        let mut lines = spawn_line_reader(input);
        let mut frames = Some(frames);

        self.say_styled(
            &format!(
                "Session {} ({} profile) ready, type ids or :help",
                self.session.session_id(),
                self.session.profile().name
            ),
            StyleRole::Header,
        );

        loop {
            tokio::select! {
                report = reports.recv() => match report {
                    Some(report) => self.print_report(&report),
                    // Pipeline task finished and dropped every sender
                    None => break,
                },
                line = lines.recv(), if frames.is_some() => {
                    let Some(sender) = frames.as_ref() else { continue };
                    let finished = match line {
                        Some(line) => self.handle_line(&line, sender, &control, &mut lines).await,
                        None => {
                            log::debug!("Input closed");
                            true
                        }
                    };
                    if finished {
                        // Closing the frame channel lets queued ids through, then ends the scan loop
                        control.resume();
                        frames = None;
                    }
                }
            }
        }

        Ok(self.finish(handle).await?)
    }

    /// Returns true when the operator asked to finish
    async fn handle_line(
        &self,
        line: &str,
        frames: &FrameSender,
        control: &DecoderControl,
        lines: &mut mpsc::Receiver<String>,
    ) -> bool {
        let parsed = match parse_line(line) {
            Ok(parsed) => parsed,
            Err(message) => {
                self.say_styled(&message, StyleRole::Warning);
                return false;
            }
        };

        match parsed {
            InputLine::Blank => {}
            InputLine::Identifier(id) => {
                if !frames.offer(id) {
                    self.say_styled("Scanning is paused, :resume to continue", StyleRole::Warning);
                }
            }
            InputLine::Command(command) => {
                log::debug!("Command :{}", command);
                match command {
                    SessionCommand::Pause => {
                        control.pause();
                        self.say_styled("Scanning paused", StyleRole::Info);
                    }
                    SessionCommand::Resume => {
                        control.resume();
                        self.say_styled("Scanning resumed", StyleRole::Info);
                    }
                    SessionCommand::Delete(ledger_id) => self.delete(&ledger_id).await,
                    SessionCommand::Unvalidate(id) => self.unvalidate(&id, lines).await,
                    SessionCommand::List => self.list(),
                    SessionCommand::Help => self.say(HELP_TEXT),
                    SessionCommand::Finish => return true,
                }
            }
        }
        false
    }

    async fn delete(&self, ledger_id: &str) {
        match self.session.delete_scan(&LedgerId::new(ledger_id)).await {
            Ok(outcome) => self.say(&display::delete_line(&outcome, self.use_color)),
            Err(e) => self.say_styled(&e.to_string(), StyleRole::Warning),
        }
    }

    async fn unvalidate(&self, identifier: &str, lines: &mut mpsc::Receiver<String>) {
        match self.session.identifier_state(identifier) {
            Ok(IdentifierState::Validated) => {}
            Ok(_) => {
                self.say_styled(&format!("'{}' is not validated", identifier), StyleRole::Warning);
                return;
            }
            Err(e) => {
                self.say_styled(&e.to_string(), StyleRole::Warning);
                return;
            }
        }

        self.say_styled(
            &format!("Unvalidate {}? [y/N]", identifier),
            StyleRole::Placeholder,
        );
        let answer = lines.recv().await.unwrap_or_default();
        let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");

        match self.session.unvalidate(identifier, |_| confirmed).await {
            Ok(outcome) => self.say(&display::unvalidate_line(&outcome, self.use_color)),
            Err(e) => self.say_styled(&e.to_string(), StyleRole::Warning),
        }
    }

    fn list(&self) {
        match self.session.snapshot() {
            Ok(snapshot) => {
                self.say(&display::session_table(&snapshot, self.use_color).to_string());
                self.say_styled(&display::snapshot_footer(&snapshot), StyleRole::Dim);
            }
            Err(e) => log_recoverable(&e, "Listing the session"),
        }
    }
}

/// Forward input lines to a channel from a dedicated task
///
/// Reading stays in one place so the confirmation prompt and the main loop
/// share the same stream.
fn spawn_line_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Reading input failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
