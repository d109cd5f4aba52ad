//! Decoder API

pub use crate::decoder::adapter::{DecoderAdapter, DecoderControl};
pub use crate::decoder::channel::{ChannelDecoder, FrameSender};
pub use crate::decoder::error::{DecoderError, DecoderResult};
pub use crate::decoder::lines::LineDecoder;
pub use crate::decoder::traits::{DecodedEvent, ScanDecoder, ScanSource};
