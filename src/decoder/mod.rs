//! Decoder Adapter
//!
//! The scan decoder is an external collaborator. This module defines the seam
//! ([`ScanDecoder`]), two concrete decoders (channel-fed frames and line
//! replay), and the adapter that turns either into one event stream with
//! pause/resume control.

pub mod adapter;
pub mod api;
pub mod channel;
pub mod error;
pub mod lines;
pub mod traits;

pub use adapter::{DecoderAdapter, DecoderControl};
pub use channel::{ChannelDecoder, FrameSender};
pub use error::{DecoderError, DecoderResult};
pub use lines::LineDecoder;
pub use traits::{DecodedEvent, ScanDecoder, ScanSource};

#[cfg(test)]
mod tests;
