use std::io;

use thiserror::Error;

/// Invalid stream layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Packet leaves no room for payload after the block index.
    #[error("packet size {packet_size} must exceed the {min}-byte block index")]
    PacketTooSmall {
        /// Configured packet size.
        packet_size: usize,
        /// Length of the block index prefix.
        min: usize,
    },

    /// Per-packet payload does not fit a fountain symbol.
    #[error("block payload of {payload_size} bytes exceeds maximum {max}")]
    SymbolTooLarge {
        /// Configured payload bytes per packet.
        payload_size: usize,
        /// Largest supported symbol.
        max: usize,
    },
}

/// Errors building a fountain encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Nothing to encode.
    #[error("cannot encode empty payload")]
    EmptyPayload,

    /// Payload needs more source symbols than one block supports.
    #[error("payload too large: {size} bytes exceeds maximum {max} bytes")]
    PayloadTooLarge {
        /// Actual payload size.
        size: usize,
        /// Maximum size for the configured packet layout.
        max: usize,
    },

    /// Invalid stream layout.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors pulling bytes from a fountain stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading the source payload failed.
    #[error("failed to read payload: {0}")]
    Io(#[from] io::Error),

    /// Encoder construction failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The encoder produced a short block twice in a row.
    #[error("block {block} short after retry: expected {expected} bytes, got {produced}")]
    ShortBlock {
        /// Index consumed by the failed retry.
        block: u32,
        /// Payload bytes per packet.
        expected: usize,
        /// Bytes the encoder wrote.
        produced: usize,
    },

    /// The 24-bit block index space is used up.
    #[error("block index space exhausted")]
    Exhausted,
}

/// Errors feeding packets to a fountain decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Packet length does not match the stream layout.
    #[error("packet size mismatch: expected {expected} bytes, got {actual}")]
    PacketSize {
        /// Configured packet size.
        expected: usize,
        /// Received packet length.
        actual: usize,
    },

    /// Decoder could not be set up for this payload and layout.
    #[error("invalid stream layout: {0}")]
    Layout(#[from] EncodeError),
}
