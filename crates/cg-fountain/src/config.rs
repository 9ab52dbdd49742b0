use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bytes of big-endian block index at the start of every packet.
pub const BLOCK_INDEX_LEN: usize = 3;

/// Largest block index the 24-bit prefix can carry.
pub const MAX_BLOCK_INDEX: u32 = (1 << 24) - 1;

/// Packet layout for a fountain stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Total bytes per packet, block index included.
    ///
    /// Default: 826
    pub packet_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { packet_size: 826 }
    }
}

impl StreamConfig {
    pub fn with_packet_size(packet_size: usize) -> Self {
        Self { packet_size }
    }

    /// Check the layout leaves room for a payload that fits one symbol.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::PacketTooSmall` or `ConfigError::SymbolTooLarge`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packet_size <= BLOCK_INDEX_LEN {
            return Err(ConfigError::PacketTooSmall {
                packet_size: self.packet_size,
                min: BLOCK_INDEX_LEN,
            });
        }
        let payload_size = self.payload_size();
        if payload_size > usize::from(u16::MAX) {
            return Err(ConfigError::SymbolTooLarge {
                payload_size,
                max: usize::from(u16::MAX),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn header_size(&self) -> usize {
        BLOCK_INDEX_LEN
    }

    /// Encoder payload bytes per packet.
    #[must_use]
    pub const fn payload_size(&self) -> usize {
        self.packet_size.saturating_sub(BLOCK_INDEX_LEN)
    }

    /// Systematic blocks needed to cover `payload_len` bytes once.
    #[must_use]
    pub const fn blocks_required(&self, payload_len: usize) -> usize {
        let size = self.payload_size();
        if size == 0 {
            return payload_len + 1;
        }
        payload_len / size + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let config = StreamConfig::default();
        assert_eq!(config.packet_size, 826);
        assert_eq!(config.header_size(), 3);
        assert_eq!(config.payload_size(), 823);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blocks_required_is_floor_plus_one() {
        let config = StreamConfig::default();
        assert_eq!(config.blocks_required(0), 1);
        assert_eq!(config.blocks_required(822), 1);
        assert_eq!(config.blocks_required(823), 2);
        assert_eq!(config.blocks_required(824), 2);
        assert_eq!(config.blocks_required(10 * 823), 11);
        assert_eq!(config.blocks_required(10 * 823 + 1), 11);
    }

    #[test]
    fn rejects_packets_without_payload_room() {
        for packet_size in [0, 1, 3] {
            let err = StreamConfig::with_packet_size(packet_size)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ConfigError::PacketTooSmall { .. }));
        }
        assert!(StreamConfig::with_packet_size(4).validate().is_ok());
    }

    #[test]
    fn rejects_oversized_symbols() {
        let config = StreamConfig::with_packet_size(usize::from(u16::MAX) + 4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SymbolTooLarge { .. })
        ));
        assert!(
            StreamConfig::with_packet_size(usize::from(u16::MAX) + 3)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = StreamConfig::with_packet_size(400);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"packet_size":400}"#);
        let back: StreamConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let defaulted: StreamConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, StreamConfig::default());
    }
}
