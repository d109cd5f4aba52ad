//! Line-oriented decoder for replaying recorded scans

use crate::decoder::error::{DecoderError, DecoderResult};
use crate::decoder::traits::{DecodedEvent, ScanDecoder, ScanSource};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::time::Instant;

/// Reads one decoded string per line; blank lines are skipped
///
/// With a pace set, consecutive events are spaced at least that far apart,
/// the way frames arrive from an operator pointing a camera.
pub struct LineDecoder<R> {
    lines: Lines<R>,
    source: ScanSource,
    decoding: bool,
    pace: Option<Duration>,
    next_due: Option<Instant>,
}

impl<R> LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, source: ScanSource) -> Self {
        Self {
            lines: reader.lines(),
            source,
            decoding: false,
            pace: None,
            next_due: None,
        }
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

#[async_trait::async_trait]
impl<R> ScanDecoder for LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn start(&mut self) -> DecoderResult<()> {
        self.decoding = true;
        Ok(())
    }

    async fn stop(&mut self) -> DecoderResult<()> {
        self.decoding = false;
        Ok(())
    }

    async fn next_event(&mut self) -> DecoderResult<Option<DecodedEvent>> {
        if !self.decoding {
            return Err(DecoderError::Stopped);
        }
        // Wait before reading so a cancelled call loses no line
        if let Some(due) = self.next_due {
            tokio::time::sleep_until(due).await;
        }
        while let Some(line) = self.lines.next_line().await? {
            let data = line.trim();
            if data.is_empty() {
                continue;
            }
            if let Some(pace) = self.pace {
                self.next_due = Some(Instant::now() + pace);
            }
            return Ok(Some(DecodedEvent {
                data: data.to_string(),
                source: self.source,
            }));
        }
        Ok(None)
    }
}
