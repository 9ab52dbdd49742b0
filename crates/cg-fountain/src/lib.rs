//! Fountain-coded framing for color-cell grid streams.
//!
//! The encode side turns one in-memory payload into an on-demand sequence of
//! fixed-size packets:
//!
//! ```text
//! | block index (24-bit BE) | encoder payload (packet_size - 3 bytes) |
//! ```
//!
//! Any sufficiently large subset of packets recovers the payload, so a reader
//! that misses frames keeps accumulating packets instead of asking for
//! retransmission. [`FountainEncoderStream`] is the pull interface;
//! [`FountainDecoderSink`] is the receive-side counterpart.
//!
//! [`FrameHeader`] is a separate 6-byte self-describing header carrying either
//! a raw 32-bit identifier or packed `(encode_id, size, block_id)` fields.

mod config;
mod decoder;
mod encoder;
mod error;
mod header;
mod stream;

pub use config::{BLOCK_INDEX_LEN, MAX_BLOCK_INDEX, StreamConfig};
pub use decoder::FountainDecoderSink;
pub use encoder::{MAX_SOURCE_SYMBOLS, RaptorQBlockEncoder, RatelessEncoder};
pub use error::{ConfigError, DecodeError, EncodeError, StreamError};
pub use header::{FrameHeader, HEADER_LEN, HeaderKind, IdHeader, PackedHeader};
pub use stream::FountainEncoderStream;
