use std::collections::HashSet;

use raptorq::{Decoder, EncodingPacket, PayloadId};
use tracing::{debug, trace};

use crate::config::{BLOCK_INDEX_LEN, StreamConfig};
use crate::encoder::{first_repair_esi, transmission_info};
use crate::error::{DecodeError, EncodeError};

/// Collects framed packets until the payload can be rebuilt.
///
/// Packets may arrive in any order, with gaps and duplicates. Both ends must
/// agree on the payload length and [`StreamConfig`].
#[derive(Debug)]
pub struct FountainDecoderSink {
    decoder: Decoder,
    config: StreamConfig,
    payload_len: usize,
    source_symbols: u32,
    repair_base: u32,
    received: HashSet<u32>,
    partial: Vec<u8>,
    payload: Option<Vec<u8>>,
}

impl FountainDecoderSink {
    /// Create a sink for a `payload_len`-byte payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Layout` if no encoder could have produced this
    /// stream.
    pub fn new(payload_len: usize, config: StreamConfig) -> Result<Self, DecodeError> {
        config.validate().map_err(EncodeError::from)?;
        let block_size = config.payload_size();
        let info = transmission_info(payload_len, block_size)?;
        // bounded by MAX_SOURCE_SYMBOLS once the layout is accepted
        #[allow(clippy::cast_possible_truncation)]
        let source_symbols = payload_len.div_ceil(block_size) as u32;

        Ok(Self {
            decoder: Decoder::new(info),
            config,
            payload_len,
            source_symbols,
            repair_base: first_repair_esi(source_symbols),
            received: HashSet::new(),
            partial: Vec::new(),
            payload: None,
        })
    }

    /// Feeds one whole packet. Returns `true` once the payload is rebuilt.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::PacketSize` if `packet` is not exactly one packet.
    pub fn push_packet(&mut self, packet: &[u8]) -> Result<bool, DecodeError> {
        if packet.len() != self.config.packet_size {
            return Err(DecodeError::PacketSize {
                expected: self.config.packet_size,
                actual: packet.len(),
            });
        }
        if self.payload.is_some() {
            return Ok(true);
        }

        let block = u32::from_be_bytes([0, packet[0], packet[1], packet[2]]);
        if !self.received.insert(block) {
            trace!(block, "duplicate packet");
            return Ok(false);
        }

        let esi = if block < self.source_symbols {
            block
        } else {
            self.repair_base + (block - self.source_symbols)
        };
        let symbol = EncodingPacket::new(
            PayloadId::new(0, esi),
            packet[BLOCK_INDEX_LEN..].to_vec(),
        );
        if let Some(payload) = self.decoder.decode(symbol) {
            debug!(
                packets = self.received.len(),
                payload_len = self.payload_len,
                "payload recovered"
            );
            self.payload = Some(payload);
        }
        Ok(self.payload.is_some())
    }

    /// Feeds a byte stream cut at arbitrary points. Returns `true` once the
    /// payload is rebuilt; leftover bytes after that are ignored.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::push_packet`].
    pub fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<bool, DecodeError> {
        let packet_size = self.config.packet_size;

        if !self.partial.is_empty() {
            let need = packet_size - self.partial.len();
            let take = need.min(bytes.len());
            self.partial.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.partial.len() < packet_size {
                return Ok(self.is_done());
            }
            let packet = std::mem::take(&mut self.partial);
            self.push_packet(&packet)?;
        }

        let mut chunks = bytes.chunks_exact(packet_size);
        for packet in chunks.by_ref() {
            if self.push_packet(packet)? {
                return Ok(true);
            }
        }
        self.partial.extend_from_slice(chunks.remainder());
        Ok(self.is_done())
    }

    pub fn is_done(&self) -> bool {
        self.payload.is_some()
    }

    /// Distinct packets accepted so far.
    pub fn received_count(&self) -> usize {
        self.received.len()
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }
}
