use std::io::{self, Read};

use tracing::{debug, warn};

use crate::config::{BLOCK_INDEX_LEN, MAX_BLOCK_INDEX, StreamConfig};
use crate::encoder::{RaptorQBlockEncoder, RatelessEncoder};
use crate::error::{ConfigError, EncodeError, StreamError};

/// Turns one payload into an on-demand sequence of framed packets.
///
/// Each packet is `packet_size` bytes: a 24-bit big-endian block index followed
/// by the encoder's block payload. Not safe for concurrent use; callers
/// serialize access to one stream.
#[derive(Debug)]
pub struct FountainEncoderStream<E = RaptorQBlockEncoder> {
    encoder: E,
    config: StreamConfig,
    payload_len: usize,
    packet: Vec<u8>,
    cursor: usize,
    block: u32,
    pending: Option<StreamError>,
}

impl FountainEncoderStream<RaptorQBlockEncoder> {
    /// Create a `RaptorQ`-backed stream over `payload`.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError` if the layout is invalid or the payload is empty
    /// or too large.
    pub fn new(payload: &[u8], config: StreamConfig) -> Result<Self, EncodeError> {
        config.validate()?;
        let encoder = RaptorQBlockEncoder::new(payload, config.payload_size())?;
        Ok(Self::with_encoder(encoder, payload.len(), config)?)
    }

    /// Drains `reader` into memory and builds a stream over its bytes.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` if reading fails and `StreamError::Encode` if
    /// the encoder cannot be built.
    pub fn from_reader<R: Read>(mut reader: R, config: StreamConfig) -> Result<Self, StreamError> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        Ok(Self::new(&payload, config)?)
    }
}

impl<E: RatelessEncoder> FountainEncoderStream<E> {
    /// Wraps an existing encoder producing `config.payload_size()`-byte blocks
    /// for a payload of `payload_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the layout is invalid.
    pub fn with_encoder(
        encoder: E,
        payload_len: usize,
        config: StreamConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            payload_len,
            packet_size = config.packet_size,
            blocks_required = config.blocks_required(payload_len),
            "fountain stream ready"
        );

        let packet = vec![0u8; config.packet_size];
        let cursor = packet.len();
        Ok(Self {
            encoder,
            config,
            payload_len,
            packet,
            cursor,
            block: 0,
            pending: None,
        })
    }

    /// Whether more packets can be produced.
    pub fn good(&self) -> bool {
        self.encoder.good() && self.block <= MAX_BLOCK_INDEX
    }

    /// Block indices consumed so far, retries included.
    pub fn block_count(&self) -> u32 {
        self.block
    }

    /// Systematic blocks needed to cover the payload once.
    pub fn blocks_required(&self) -> usize {
        self.config.blocks_required(self.payload_len)
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// The most recently produced packet.
    pub fn packet(&self) -> &[u8] {
        &self.packet
    }

    /// Produces the next packet and rewinds the read cursor.
    ///
    /// A short block consumes its index and is retried once with the next
    /// index; the skipped index never reaches the wire. Returns the index
    /// written into the packet prefix.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ShortBlock` if the retry is also short, and
    /// `StreamError::Exhausted` if the 24-bit index space is used up.
    pub fn encode_new_block(&mut self) -> Result<u32, StreamError> {
        let expected = self.config.payload_size();

        let mut block = self.next_index()?;
        let mut produced = self
            .encoder
            .encode(block, &mut self.packet[BLOCK_INDEX_LEN..]);
        if produced != expected {
            debug!(block, produced, expected, "short block, retrying");
            block = self.next_index()?;
            produced = self
                .encoder
                .encode(block, &mut self.packet[BLOCK_INDEX_LEN..]);
            if produced != expected {
                warn!(block, produced, expected, "short block after retry");
                return Err(StreamError::ShortBlock {
                    block,
                    expected,
                    produced,
                });
            }
        }

        self.packet[..BLOCK_INDEX_LEN].copy_from_slice(&block.to_be_bytes()[1..]);
        self.cursor = 0;
        Ok(block)
    }

    /// Copies up to `out.len()` bytes of packet data into `out`, producing new
    /// packets as needed.
    ///
    /// Returns fewer bytes than requested only once the stream can produce no
    /// more packets. Bytes already produced for the current packet are always
    /// delivered.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Self::encode_new_block`]. If some bytes were
    /// already copied, the error is held and returned by the next call.
    pub fn readsome(&mut self, out: &mut [u8]) -> Result<usize, StreamError> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let mut total = 0;
        while total < out.len() {
            if self.cursor >= self.packet.len() {
                if !self.good() {
                    break;
                }
                if let Err(err) = self.encode_new_block() {
                    if total == 0 {
                        return Err(err);
                    }
                    self.pending = Some(err);
                    break;
                }
            }

            let len = (out.len() - total).min(self.packet.len() - self.cursor);
            out[total..total + len].copy_from_slice(&self.packet[self.cursor..self.cursor + len]);
            total += len;
            self.cursor += len;
        }
        Ok(total)
    }

    fn next_index(&mut self) -> Result<u32, StreamError> {
        if self.block > MAX_BLOCK_INDEX {
            return Err(StreamError::Exhausted);
        }
        let block = self.block;
        self.block += 1;
        Ok(block)
    }
}

impl<E: RatelessEncoder> Read for FountainEncoderStream<E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.readsome(buf).map_err(io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fills each block with its index; gives up after `limit` calls and writes
    /// `short_len` bytes for indices listed in `short`.
    #[derive(Debug)]
    struct ScriptedEncoder {
        calls: u32,
        limit: u32,
        short: Vec<u32>,
        short_len: usize,
    }

    impl ScriptedEncoder {
        fn new(limit: u32) -> Self {
            Self {
                calls: 0,
                limit,
                short: Vec::new(),
                short_len: 0,
            }
        }

        fn short_at(mut self, blocks: &[u32], len: usize) -> Self {
            self.short = blocks.to_vec();
            self.short_len = len;
            self
        }
    }

    impl RatelessEncoder for ScriptedEncoder {
        fn good(&self) -> bool {
            self.calls < self.limit
        }

        fn encode(&mut self, block: u32, out: &mut [u8]) -> usize {
            self.calls += 1;
            out.fill(block as u8);
            if self.short.contains(&block) {
                self.short_len
            } else {
                out.len()
            }
        }
    }

    fn stream(
        encoder: ScriptedEncoder,
        packet_size: usize,
    ) -> FountainEncoderStream<ScriptedEncoder> {
        let config = StreamConfig::with_packet_size(packet_size);
        FountainEncoderStream::with_encoder(encoder, 100, config).unwrap()
    }

    fn prefix(packet: &[u8]) -> u32 {
        u32::from_be_bytes([0, packet[0], packet[1], packet[2]])
    }

    #[test]
    fn starts_with_no_blocks() {
        let s = stream(ScriptedEncoder::new(10), 8);
        assert_eq!(s.block_count(), 0);
        assert!(s.good());
        assert_eq!(s.blocks_required(), 100 / 5 + 1);
    }

    #[test]
    fn packets_carry_big_endian_index() {
        let mut s = stream(ScriptedEncoder::new(100), 8);
        let mut out = vec![0u8; 8 * 4];
        assert_eq!(s.readsome(&mut out).unwrap(), out.len());

        for (n, packet) in out.chunks_exact(8).enumerate() {
            assert_eq!(prefix(packet), n as u32);
            assert!(packet[3..].iter().all(|&b| b == n as u8));
        }
        assert_eq!(s.block_count(), 4);
    }

    #[test]
    fn short_block_consumes_its_index() {
        let mut s = stream(ScriptedEncoder::new(100).short_at(&[2], 1), 8);
        let mut out = vec![0u8; 8 * 4];
        assert_eq!(s.readsome(&mut out).unwrap(), out.len());

        let indices: Vec<u32> = out.chunks_exact(8).map(prefix).collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
        assert_eq!(s.block_count(), 5);
        assert!(out[16 + 3..24].iter().all(|&b| b == 3));
    }

    #[test]
    fn second_short_block_is_reported() {
        let mut s = stream(ScriptedEncoder::new(100).short_at(&[0, 1], 2), 8);
        let err = s.encode_new_block().unwrap_err();
        assert!(matches!(
            err,
            StreamError::ShortBlock {
                block: 1,
                expected: 5,
                produced: 2
            }
        ));
        assert_eq!(s.block_count(), 2);

        // the stream moves on to the next index
        assert_eq!(s.encode_new_block().unwrap(), 2);
        assert_eq!(prefix(s.packet()), 2);
    }

    #[test]
    fn error_after_partial_read_is_deferred() {
        let mut s = stream(ScriptedEncoder::new(100).short_at(&[1, 2], 0), 8);
        let mut out = vec![0u8; 12];
        assert_eq!(s.readsome(&mut out).unwrap(), 8);
        assert!(matches!(
            s.readsome(&mut out),
            Err(StreamError::ShortBlock { block: 2, .. })
        ));
        assert_eq!(s.readsome(&mut out).unwrap(), 12);
        assert_eq!(prefix(&out), 3);
    }

    #[test]
    fn stops_when_encoder_is_done() {
        let mut s = stream(ScriptedEncoder::new(3), 8);
        let mut out = vec![0u8; 100];
        assert_eq!(s.readsome(&mut out).unwrap(), 24);
        assert!(!s.good());
        assert_eq!(s.readsome(&mut out).unwrap(), 0);
    }

    #[test]
    fn current_packet_drains_after_encoder_stops() {
        let mut s = stream(ScriptedEncoder::new(1), 8);
        let mut out = [0u8; 3];
        assert_eq!(s.readsome(&mut out).unwrap(), 3);
        assert!(!s.good());
        let mut rest = [0u8; 10];
        assert_eq!(s.readsome(&mut rest).unwrap(), 5);
    }

    #[test]
    fn small_reads_match_one_large_read() {
        let mut whole = stream(ScriptedEncoder::new(1000), 11);
        let mut expected = vec![0u8; 500];
        assert_eq!(whole.readsome(&mut expected).unwrap(), 500);

        let mut pieces = stream(ScriptedEncoder::new(1000), 11);
        let mut got = Vec::new();
        for size in [1usize, 7, 3, 11, 25, 0, 2].iter().cycle() {
            if got.len() >= 500 {
                break;
            }
            let mut buf = vec![0u8; (*size).min(500 - got.len())];
            let n = pieces.readsome(&mut buf).unwrap();
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(got, expected);
    }

    #[test]
    fn implements_read() {
        let mut s = stream(ScriptedEncoder::new(10), 8);
        let mut out = [0u8; 16];
        s.read_exact(&mut out).unwrap();
        assert_eq!(prefix(&out[8..]), 1);
    }

    #[test]
    fn invalid_layout_rejected() {
        let result = FountainEncoderStream::with_encoder(
            ScriptedEncoder::new(1),
            10,
            StreamConfig::with_packet_size(3),
        );
        assert!(matches!(result, Err(ConfigError::PacketTooSmall { .. })));
    }

    #[test]
    fn raptorq_stream_from_reader() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 253) as u8).collect();
        let mut s =
            FountainEncoderStream::from_reader(&data[..], StreamConfig::with_packet_size(503))
                .unwrap();
        assert_eq!(s.payload_len(), 2000);
        assert_eq!(s.blocks_required(), 5);
        assert_eq!(s.encoder().source_symbols(), 4);

        let mut out = vec![0u8; 503 * 2];
        assert_eq!(s.readsome(&mut out).unwrap(), out.len());
        assert_eq!(&out[3..503], &data[..500]);
        assert_eq!(prefix(&out[503..]), 1);
        assert_eq!(&out[506..], &data[500..1000]);
    }

    #[test]
    fn empty_reader_rejected() {
        let result = FountainEncoderStream::from_reader(io::empty(), StreamConfig::default());
        assert!(matches!(
            result,
            Err(StreamError::Encode(EncodeError::EmptyPayload))
        ));
    }
}
