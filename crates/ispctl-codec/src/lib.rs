//! Size-aware JSON message codec for fixed-capacity ISP control buffers.
//!
//! The VIV ISP control protocol carries UTF-8 JSON text inside one
//! fixed-capacity byte buffer that is zero-padded to its full size. This
//! crate owns both directions of that conversion:
//! - encoding a structured message, refusing anything that would not fit
//!   in the buffer alongside its NUL delimiter;
//! - decoding the driver's reply, treating the first NUL byte as the end
//!   of content.

pub mod codec;
pub mod error;

pub use codec::{fill, trim_padding, MessageCodec, DEFAULT_CAPACITY};
pub use error::{CodecError, Result};
