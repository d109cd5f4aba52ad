//! Decoder seam

use crate::decoder::error::DecoderResult;
use strum_macros::{Display, EnumString};

/// Where a decoded string came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ScanSource {
    Camera,
    Manual,
}

/// One decoded string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub data: String,
    pub source: ScanSource,
}

impl DecodedEvent {
    pub fn camera(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            source: ScanSource::Camera,
        }
    }

    pub fn manual(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            source: ScanSource::Manual,
        }
    }
}

/// External scan decoder
///
/// `next_event` must be cancel safe: the adapter races it against control
/// changes and drops the losing future. `Ok(None)` ends the stream.
#[async_trait::async_trait]
pub trait ScanDecoder: Send {
    /// Begin or resume decoding
    async fn start(&mut self) -> DecoderResult<()>;

    /// Suspend decoding; session state is untouched
    async fn stop(&mut self) -> DecoderResult<()>;

    async fn next_event(&mut self) -> DecoderResult<Option<DecodedEvent>>;
}
