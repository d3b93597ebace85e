//! Packed wire header
//!
//! The header is 16 bytes and prefixes every message buffer.

use std::fmt;

use super::{
    CFG_MAX, Error, HEADER_SIZE, HEART_RATE_DEFAULT, HOP_LIMIT_MAX, PRIORITY_MAX, Priority, Result,
};

const RESERVED_MASK: u8 = 0x07;
const CFG_SHIFT: u8 = 3;
const CFG_MASK: u8 = 0x18;
const PRIORITY_SHIFT: u8 = 5;
#[allow(clippy::cast_possible_truncation)]
const HEADER_LEN: u16 = HEADER_SIZE as u16;

/// Wire header (16 bytes, multi-byte fields little-endian)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Hop Limit   |rsv|cfg| prio  |          Heart Rate           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Source Id (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Destination Id (4)                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Length             |           Checksum            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The second octet packs the reserved field into bits 0-2, `cfg` into
/// bits 3-4 and `priority` into bits 5-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    hop_limit: u8,
    reserved: u8,
    cfg: u8,
    priority: u8,
    heart_rate: u16,
    src_id: u32,
    dst_id: u32,
    len: u16,
    checksum: u16,
}

impl WireHeader {
    /// Create a header describing a message of `len` bytes.
    pub fn new(len: u16) -> Result<Self> {
        let mut header = Self::default();
        header.set_len(len)?;
        Ok(header)
    }

    /// Get hop limit
    #[must_use]
    pub const fn hop_limit(&self) -> u8 {
        self.hop_limit
    }

    /// Set hop limit (0..=128)
    pub fn set_hop_limit(&mut self, hop_limit: u8) -> Result<()> {
        if hop_limit > HOP_LIMIT_MAX {
            return Err(Error::invalid(
                "hop_limit",
                format!("{hop_limit} exceeds maximum {HOP_LIMIT_MAX}"),
            ));
        }
        self.hop_limit = hop_limit;
        Ok(())
    }

    /// Get reserved bits
    #[must_use]
    pub const fn reserved(&self) -> u8 {
        self.reserved
    }

    /// Get cfg field
    #[must_use]
    pub const fn cfg(&self) -> u8 {
        self.cfg
    }

    /// Set cfg field (0..=3)
    pub fn set_cfg(&mut self, cfg: u8) -> Result<()> {
        if cfg > CFG_MAX {
            return Err(Error::invalid("cfg", format!("{cfg} exceeds maximum {CFG_MAX}")));
        }
        self.cfg = cfg;
        Ok(())
    }

    /// Get raw priority
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    /// Get priority level
    #[must_use]
    pub fn priority_level(&self) -> Priority {
        Priority::from_u8(self.priority).unwrap_or(Priority::Level4)
    }

    /// Set raw priority (0..=4)
    pub fn set_priority(&mut self, priority: u8) -> Result<()> {
        if priority > PRIORITY_MAX {
            return Err(Error::invalid(
                "priority",
                format!("{priority} exceeds maximum {PRIORITY_MAX}"),
            ));
        }
        self.priority = priority;
        Ok(())
    }

    /// Set priority level
    pub fn set_priority_level(&mut self, priority: Priority) {
        self.priority = priority.as_u8();
    }

    /// Get heart rate in seconds
    #[must_use]
    pub const fn heart_rate(&self) -> u16 {
        self.heart_rate
    }

    /// Set heart rate in seconds
    pub fn set_heart_rate(&mut self, heart_rate: u16) {
        self.heart_rate = heart_rate;
    }

    /// Get source node id
    #[must_use]
    pub const fn src_id(&self) -> u32 {
        self.src_id
    }

    /// Set source node id
    pub fn set_src_id(&mut self, src_id: u32) {
        self.src_id = src_id;
    }

    /// Get destination node id
    #[must_use]
    pub const fn dst_id(&self) -> u32 {
        self.dst_id
    }

    /// Set destination node id
    pub fn set_dst_id(&mut self, dst_id: u32) {
        self.dst_id = dst_id;
    }

    /// Get total message length (header + records)
    #[must_use]
    pub const fn len(&self) -> u16 {
        self.len
    }

    /// Set total message length; must cover at least the header itself.
    pub fn set_len(&mut self, len: u16) -> Result<()> {
        if usize::from(len) < HEADER_SIZE {
            return Err(Error::invalid(
                "len",
                format!("{len} is below header size {HEADER_SIZE}"),
            ));
        }
        self.len = len;
        Ok(())
    }

    /// Get checksum
    #[must_use]
    pub const fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Set checksum
    pub fn set_checksum(&mut self, checksum: u16) {
        self.checksum = checksum;
    }

    /// Validate every ranged field
    pub fn validate(&self) -> Result<()> {
        if self.hop_limit > HOP_LIMIT_MAX {
            return Err(Error::invalid(
                "hop_limit",
                format!("{} exceeds maximum {HOP_LIMIT_MAX}", self.hop_limit),
            ));
        }
        if self.priority > PRIORITY_MAX {
            return Err(Error::invalid(
                "priority",
                format!("{} exceeds maximum {PRIORITY_MAX}", self.priority),
            ));
        }
        if usize::from(self.len) < HEADER_SIZE {
            return Err(Error::invalid(
                "len",
                format!("{} is below header size {HEADER_SIZE}", self.len),
            ));
        }
        Ok(())
    }

    /// Convert to bytes (little-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        self.write_to(&mut bytes);
        bytes
    }

    /// Parse from bytes (little-endian) and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::BufferTooSmall {
                needed: HEADER_SIZE,
                got: bytes.len(),
            });
        }

        let header = Self::read_from(&bytes[..HEADER_SIZE]);
        header.validate()?;
        Ok(header)
    }

    /// Pack into the first [`HEADER_SIZE`] bytes of `out`.
    pub(crate) fn write_to(&self, out: &mut [u8]) {
        out[0] = self.hop_limit;
        out[1] = (self.reserved & RESERVED_MASK)
            | ((self.cfg << CFG_SHIFT) & CFG_MASK)
            | (self.priority << PRIORITY_SHIFT);
        out[2..4].copy_from_slice(&self.heart_rate.to_le_bytes());
        out[4..8].copy_from_slice(&self.src_id.to_le_bytes());
        out[8..12].copy_from_slice(&self.dst_id.to_le_bytes());
        out[12..14].copy_from_slice(&self.len.to_le_bytes());
        out[14..16].copy_from_slice(&self.checksum.to_le_bytes());
    }

    /// Unpack without validation; `bytes` must hold at least [`HEADER_SIZE`] bytes.
    pub(crate) fn read_from(bytes: &[u8]) -> Self {
        let flags = bytes[1];
        Self {
            hop_limit: bytes[0],
            reserved: flags & RESERVED_MASK,
            cfg: (flags & CFG_MASK) >> CFG_SHIFT,
            priority: flags >> PRIORITY_SHIFT,
            heart_rate: u16::from_le_bytes([bytes[2], bytes[3]]),
            src_id: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            dst_id: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            len: u16::from_le_bytes([bytes[12], bytes[13]]),
            checksum: u16::from_le_bytes([bytes[14], bytes[15]]),
        }
    }
}

impl Default for WireHeader {
    fn default() -> Self {
        Self {
            hop_limit: 0,
            reserved: 0,
            cfg: 0,
            priority: 0,
            heart_rate: HEART_RATE_DEFAULT,
            src_id: 0,
            dst_id: 0,
            len: HEADER_LEN,
            checksum: 0,
        }
    }
}

impl fmt::Display for WireHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hop_limit={} cfg={} priority={} heart_rate={} src={:#x} dst={:#x} len={} checksum={:#06x}",
            self.hop_limit,
            self.cfg,
            self.priority,
            self.heart_rate,
            self.src_id,
            self.dst_id,
            self.len,
            self.checksum
        )
    }
}
