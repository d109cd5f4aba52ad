//! Decoder Adapter
//!
//! Wraps any [`ScanDecoder`] into a single stream of decoded strings and
//! applies pause/resume requests from a [`DecoderControl`]. Pausing stops the
//! decoder only; whatever the session is doing with earlier scans carries on.

use crate::decoder::error::DecoderResult;
use crate::decoder::traits::{DecodedEvent, ScanDecoder};
use std::sync::Arc;
use tokio::sync::watch;

/// Pause/resume handle shared with the presentation layer
#[derive(Debug, Clone)]
pub struct DecoderControl {
    tx: Arc<watch::Sender<bool>>,
}

impl DecoderControl {
    pub fn pause(&self) {
        self.tx.send_replace(false);
    }

    pub fn resume(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct DecoderAdapter {
    decoder: Box<dyn ScanDecoder>,
    control: watch::Receiver<bool>,
    control_open: bool,
    running: bool,
}

impl DecoderAdapter {
    /// Wrap a decoder; it starts on the first call to [`next`](Self::next)
    pub fn new(decoder: Box<dyn ScanDecoder>) -> (Self, DecoderControl) {
        let (tx, control) = watch::channel(true);
        (
            Self {
                decoder,
                control,
                control_open: true,
                running: false,
            },
            DecoderControl { tx: Arc::new(tx) },
        )
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the decoder now instead of on the first [`next`](Self::next)
    pub async fn start(&mut self) -> DecoderResult<()> {
        self.apply_control().await
    }

    async fn apply_control(&mut self) -> DecoderResult<()> {
        let wanted = *self.control.borrow_and_update();
        if wanted == self.running {
            return Ok(());
        }
        if wanted {
            self.decoder.start().await?;
            log::debug!("Decoder started");
        } else {
            self.decoder.stop().await?;
            log::debug!("Decoder stopped");
        }
        self.running = wanted;
        Ok(())
    }

    /// Next non-empty decoded string, or `None` once input ends
    ///
    /// Waits while paused. If the control handle is gone while paused, the
    /// stream ends.
    pub async fn next(&mut self) -> DecoderResult<Option<DecodedEvent>> {
        loop {
            self.apply_control().await?;

            if !self.running {
                if !self.control_open || self.control.changed().await.is_err() {
                    return Ok(None);
                }
                continue;
            }

            tokio::select! {
                changed = self.control.changed(), if self.control_open => {
                    if changed.is_err() {
                        self.control_open = false;
                    }
                }
                event = self.decoder.next_event() => {
                    match event? {
                        None => return Ok(None),
                        Some(event) if event.data.trim().is_empty() => {
                            log::trace!("Skipping empty decode");
                        }
                        Some(event) => {
                            log::trace!("Decoded {} input: {}", event.source, event.data);
                            return Ok(Some(event));
                        }
                    }
                }
            }
        }
    }

    /// Stop the underlying decoder for good
    pub async fn shutdown(&mut self) -> DecoderResult<()> {
        if self.running {
            self.decoder.stop().await?;
            self.running = false;
        }
        Ok(())
    }
}
