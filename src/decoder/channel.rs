//! Channel-fed decoder
//!
//! Frames are pushed by whatever owns the camera (or the terminal) through a
//! [`FrameSender`]. Frames offered while the decoder is stopped are refused,
//! and anything still queued from before a stop is discarded on start.

use crate::decoder::error::{DecoderError, DecoderResult};
use crate::decoder::traits::{DecodedEvent, ScanDecoder, ScanSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

const FRAME_BUFFER: usize = 64;

/// Producer half of a [`ChannelDecoder`]
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<String>,
    decoding: Arc<AtomicBool>,
}

impl FrameSender {
    /// Offer a decoded frame; returns whether it was queued
    pub fn offer(&self, data: impl Into<String>) -> bool {
        if !self.decoding.load(Ordering::SeqCst) {
            return false;
        }
        match self.tx.try_send(data.into()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::trace!("Frame buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_decoding(&self) -> bool {
        self.decoding.load(Ordering::SeqCst)
    }
}

pub struct ChannelDecoder {
    rx: mpsc::Receiver<String>,
    decoding: Arc<AtomicBool>,
    source: ScanSource,
}

impl ChannelDecoder {
    pub fn new(source: ScanSource) -> (Self, FrameSender) {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let decoding = Arc::new(AtomicBool::new(false));
        let sender = FrameSender {
            tx,
            decoding: Arc::clone(&decoding),
        };
        (
            Self {
                rx,
                decoding,
                source,
            },
            sender,
        )
    }
}

#[async_trait::async_trait]
impl ScanDecoder for ChannelDecoder {
    async fn start(&mut self) -> DecoderResult<()> {
        let mut stale = 0usize;
        while self.rx.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            log::debug!("Discarded {} stale frames", stale);
        }
        self.decoding.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> DecoderResult<()> {
        self.decoding.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&mut self) -> DecoderResult<Option<DecodedEvent>> {
        if !self.decoding.load(Ordering::SeqCst) {
            return Err(DecoderError::Stopped);
        }
        Ok(self.rx.recv().await.map(|data| DecodedEvent {
            data,
            source: self.source,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_refused_while_stopped() {
        let (mut decoder, sender) = ChannelDecoder::new(ScanSource::Camera);

        assert!(!sender.offer("https://tier.app/AB123"));

        decoder.start().await.unwrap();
        assert!(sender.offer("https://tier.app/AB123"));

        let event = decoder.next_event().await.unwrap().unwrap();
        assert_eq!(event, DecodedEvent::camera("https://tier.app/AB123"));
    }

    #[tokio::test]
    async fn test_start_discards_stale_frames() {
        let (mut decoder, sender) = ChannelDecoder::new(ScanSource::Camera);
        decoder.start().await.unwrap();
        sender.offer("old-1");
        sender.offer("old-2");

        decoder.stop().await.unwrap();
        decoder.start().await.unwrap();
        sender.offer("new");

        let event = decoder.next_event().await.unwrap().unwrap();
        assert_eq!(event.data, "new");
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (mut decoder, sender) = ChannelDecoder::new(ScanSource::Manual);
        decoder.start().await.unwrap();
        drop(sender);

        assert!(decoder.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_event_while_stopped_is_error() {
        let (mut decoder, _sender) = ChannelDecoder::new(ScanSource::Camera);
        assert!(matches!(
            decoder.next_event().await,
            Err(DecoderError::Stopped)
        ));
    }
}
