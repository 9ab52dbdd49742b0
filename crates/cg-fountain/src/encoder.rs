// Symbol counts are bounded by MAX_SOURCE_SYMBOLS and the 24-bit index space
#![allow(clippy::cast_possible_truncation)]

use raptorq::{Encoder, EncodingPacket, ObjectTransmissionInformation, SourceBlockEncoder};

use crate::error::{ConfigError, EncodeError};

/// Source of fixed-size fountain blocks.
pub trait RatelessEncoder {
    /// Whether more blocks can be produced.
    fn good(&self) -> bool;

    /// Writes block `block` into `out` and returns the bytes written.
    ///
    /// Writing fewer than `out.len()` bytes is a short block.
    fn encode(&mut self, block: u32, out: &mut [u8]) -> usize;
}

/// Most source symbols a single `RaptorQ` source block may hold.
pub const MAX_SOURCE_SYMBOLS: usize = 56_403;

/// `RaptorQ` encoder over one source block.
///
/// Block indices are encoding symbol ids: indices below K return the
/// systematic symbols, the rest return repair symbols.
#[derive(Debug, Clone)]
pub struct RaptorQBlockEncoder {
    inner: Encoder,
    source: Vec<EncodingPacket>,
}

impl RaptorQBlockEncoder {
    /// Create encoder for a payload split into `block_size`-byte symbols.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::EmptyPayload` for an empty payload,
    /// `EncodeError::PayloadTooLarge` if it needs more than one source block,
    /// and `EncodeError::Config` if `block_size` is zero or above `u16::MAX`.
    pub fn new(payload: &[u8], block_size: usize) -> Result<Self, EncodeError> {
        let config = transmission_info(payload.len(), block_size)?;
        let inner = Encoder::new(payload, config);
        let source = inner
            .get_block_encoders()
            .first()
            .map(SourceBlockEncoder::source_packets)
            .ok_or(EncodeError::EmptyPayload)?;

        Ok(Self { inner, source })
    }

    /// Get K (number of source symbols).
    #[must_use]
    pub fn source_symbols(&self) -> u32 {
        self.source.len() as u32
    }

    fn repair(&self, block: u32) -> Option<EncodingPacket> {
        let repair_id = block.checked_sub(self.source_symbols())?;
        self.inner
            .get_block_encoders()
            .first()?
            .repair_packets(repair_id, 1)
            .pop()
    }
}

impl RatelessEncoder for RaptorQBlockEncoder {
    fn good(&self) -> bool {
        !self.source.is_empty()
    }

    fn encode(&mut self, block: u32, out: &mut [u8]) -> usize {
        let repair;
        let data = match self.source.get(block as usize) {
            Some(packet) => packet.data(),
            None => match self.repair(block) {
                Some(packet) => {
                    repair = packet;
                    repair.data()
                }
                None => return 0,
            },
        };

        let len = data.len().min(out.len());
        out[..len].copy_from_slice(&data[..len]);
        len
    }
}

/// Transmission info shared by both ends of a stream: one source block, one
/// sub-block, byte alignment.
pub(crate) fn transmission_info(
    payload_len: usize,
    block_size: usize,
) -> Result<ObjectTransmissionInformation, EncodeError> {
    if block_size == 0 {
        return Err(ConfigError::PacketTooSmall {
            packet_size: block_size + crate::config::BLOCK_INDEX_LEN,
            min: crate::config::BLOCK_INDEX_LEN,
        }
        .into());
    }
    let symbol_size = u16::try_from(block_size).map_err(|_| ConfigError::SymbolTooLarge {
        payload_size: block_size,
        max: usize::from(u16::MAX),
    })?;

    if payload_len == 0 {
        return Err(EncodeError::EmptyPayload);
    }
    let max = MAX_SOURCE_SYMBOLS * block_size;
    if payload_len > max {
        return Err(EncodeError::PayloadTooLarge {
            size: payload_len,
            max,
        });
    }

    Ok(ObjectTransmissionInformation::new(
        payload_len as u64,
        symbol_size,
        1,
        1,
        1,
    ))
}

/// Encoding symbol id carried by the first repair symbol of a block with
/// `source_symbols` source symbols.
///
/// Probes a one-byte-symbol encoder so the wire index to symbol id mapping
/// follows whatever the codec emits.
pub(crate) fn first_repair_esi(source_symbols: u32) -> u32 {
    let probe = vec![0u8; source_symbols as usize];
    let config = ObjectTransmissionInformation::new(u64::from(source_symbols), 1, 1, 1, 1);
    Encoder::new(&probe, config)
        .get_block_encoders()
        .first()
        .and_then(|block| block.repair_packets(0, 1).pop())
        .map_or(source_symbols, |packet| {
            packet.payload_id().encoding_symbol_id()
        })
}
