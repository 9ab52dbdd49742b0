//! Six-byte frame header codec.
//!
//! The same six bytes carry one of two layouts:
//!
//! ```text
//! id form:      | id (u32, little-endian) | 0x00 | 0x00 |
//! packed form:  byte 0     = encode_id (bits 0-6) | size bit 24 (bit 7)
//!               bytes 1-3  = size bits 16-23, 8-15, 0-7
//!               bytes 4-5  = block_id (u16, big-endian)
//! ```
//!
//! The bytes alone do not say which layout applies, so the layout travels with
//! the header as the [`FrameHeader`] variant.

/// Header length in bytes.
pub const HEADER_LEN: usize = 6;

const ENCODE_ID_MASK: u8 = 0x7F;
const SIZE_HIGH_BIT: u8 = 0x80;

/// Copies up to `HEADER_LEN` bytes; missing bytes stay zero.
fn copy_prefix(buf: &[u8]) -> [u8; HEADER_LEN] {
    let mut data = [0u8; HEADER_LEN];
    let len = buf.len().min(HEADER_LEN);
    data[..len].copy_from_slice(&buf[..len]);
    data
}

/// Header carrying a raw 32-bit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IdHeader([u8; HEADER_LEN]);

impl IdHeader {
    pub fn new(id: u32) -> Self {
        let mut data = [0u8; HEADER_LEN];
        data[..4].copy_from_slice(&id.to_le_bytes());
        Self(data)
    }

    /// Reads up to six bytes from `buf`; a shorter buffer leaves the tail zero.
    pub fn from_bytes(buf: &[u8]) -> Self {
        Self(copy_prefix(buf))
    }

    pub fn id(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

/// Header carrying `(encode_id, size, block_id)` packed into 7/25/16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedHeader([u8; HEADER_LEN]);

impl PackedHeader {
    /// Largest `encode_id` that survives packing.
    pub const MAX_ENCODE_ID: u8 = ENCODE_ID_MASK;
    /// Largest `size` that survives packing.
    pub const MAX_SIZE: u32 = (1 << 25) - 1;

    /// Packs the fields; bits above 7 (`encode_id`) and 25 (`size`) are dropped.
    pub fn new(encode_id: u8, size: u32, block_id: u16) -> Self {
        let mut data = [0u8; HEADER_LEN];
        Self::write(encode_id, size, block_id, &mut data);
        Self(data)
    }

    /// Packs the fields straight into `out`.
    pub fn write(encode_id: u8, size: u32, block_id: u16, out: &mut [u8; HEADER_LEN]) {
        out[0] = (encode_id & ENCODE_ID_MASK) | ((size >> 17) as u8 & SIZE_HIGH_BIT);
        out[1] = (size >> 16) as u8;
        out[2] = (size >> 8) as u8;
        out[3] = size as u8;
        out[4..6].copy_from_slice(&block_id.to_be_bytes());
    }

    /// Reads up to six bytes from `buf`; a shorter buffer leaves the tail zero.
    pub fn from_bytes(buf: &[u8]) -> Self {
        Self(copy_prefix(buf))
    }

    pub fn encode_id(&self) -> u8 {
        self.0[0] & ENCODE_ID_MASK
    }

    pub fn file_size(&self) -> u32 {
        let d = &self.0;
        u32::from(d[3])
            | (u32::from(d[2]) << 8)
            | (u32::from(d[1]) << 16)
            | (u32::from(d[0] & SIZE_HIGH_BIT) << 17)
    }

    pub fn block_id(&self) -> u16 {
        u16::from_be_bytes([self.0[4], self.0[5]])
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

/// Which layout a header's bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Id,
    Packed,
}

/// A frame header tagged with its layout.
///
/// Field accessors return `None` when asked for a field the layout does not
/// carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameHeader {
    Id(IdHeader),
    Packed(PackedHeader),
}

impl FrameHeader {
    pub fn from_id(id: u32) -> Self {
        Self::Id(IdHeader::new(id))
    }

    pub fn packed(encode_id: u8, size: u32, block_id: u16) -> Self {
        Self::Packed(PackedHeader::new(encode_id, size, block_id))
    }

    /// Interprets up to six bytes of `buf` as `kind`; missing bytes are zero.
    pub fn from_bytes(kind: HeaderKind, buf: &[u8]) -> Self {
        match kind {
            HeaderKind::Id => Self::Id(IdHeader::from_bytes(buf)),
            HeaderKind::Packed => Self::Packed(PackedHeader::from_bytes(buf)),
        }
    }

    pub fn kind(&self) -> HeaderKind {
        match self {
            Self::Id(_) => HeaderKind::Id,
            Self::Packed(_) => HeaderKind::Packed,
        }
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        match self {
            Self::Id(h) => h.as_bytes(),
            Self::Packed(h) => h.as_bytes(),
        }
    }

    pub fn id(&self) -> Option<u32> {
        match self {
            Self::Id(h) => Some(h.id()),
            Self::Packed(_) => None,
        }
    }

    pub fn encode_id(&self) -> Option<u8> {
        match self {
            Self::Packed(h) => Some(h.encode_id()),
            Self::Id(_) => None,
        }
    }

    pub fn file_size(&self) -> Option<u32> {
        match self {
            Self::Packed(h) => Some(h.file_size()),
            Self::Id(_) => None,
        }
    }

    pub fn block_id(&self) -> Option<u16> {
        match self {
            Self::Packed(h) => Some(h.block_id()),
            Self::Id(_) => None,
        }
    }
}

impl From<IdHeader> for FrameHeader {
    fn from(h: IdHeader) -> Self {
        Self::Id(h)
    }
}

impl From<PackedHeader> for FrameHeader {
    fn from(h: PackedHeader) -> Self {
        Self::Packed(h)
    }
}
