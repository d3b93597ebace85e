//! Whole-message codec and checksum helpers
//!
//! # Format
//!
//! ```text
//! [HEADER (16 bytes)] [RECORD]* [SENTINEL / FREE SPACE]
//! ```
//!
//! `header.len` covers the whole message. The checksum field is never
//! checked implicitly: callers [`seal`] before sending and
//! [`verify_checksum`] on receipt if their link needs it.

use bytes::Bytes;
use xxhash_rust::xxh3::Xxh3;

use super::record::zeroed;
use super::{Error, HEADER_SIZE, MessageBuffer, Result, WireHeader};

const CHECKSUM_OFFSET: usize = 14;

/// Encode a message buffer to bytes.
#[must_use]
pub fn encode(message: &MessageBuffer) -> Bytes {
    Bytes::copy_from_slice(message.as_bytes())
}

/// Decode a message buffer from bytes
///
/// # Errors
///
/// Returns an error if:
/// - the input is shorter than a header or than `header.len`
/// - the input is longer than `header.len`
/// - a header field is out of range
/// - a record runs past the end of the message
pub fn decode(bytes: &[u8]) -> Result<MessageBuffer> {
    let header = WireHeader::from_bytes(bytes)?;

    let declared = usize::from(header.len());
    if bytes.len() < declared {
        return Err(Error::BufferTooSmall {
            needed: declared,
            got: bytes.len(),
        });
    }
    if bytes.len() > declared {
        return Err(Error::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    let mut data = zeroed(declared)?;
    data.copy_from_slice(bytes);
    let message = MessageBuffer::from_vec(data);

    // Reject overrunning records up front so later walks cannot fail.
    message.used_len()?;
    Ok(message)
}

/// Checksum over the message with the checksum field taken as zero.
///
/// XXH3-64 folded to 16 bits.
#[must_use]
pub fn compute_checksum(message: &MessageBuffer) -> u16 {
    let bytes = message.as_bytes();
    let mut hasher = Xxh3::new();
    hasher.update(&bytes[..CHECKSUM_OFFSET]);
    hasher.update(&[0, 0]);
    hasher.update(&bytes[HEADER_SIZE..]);
    fold(hasher.digest())
}

/// Stamp the header checksum.
pub fn seal(message: &mut MessageBuffer) {
    let checksum = compute_checksum(message);
    message.as_bytes_mut()[CHECKSUM_OFFSET..HEADER_SIZE].copy_from_slice(&checksum.to_le_bytes());
}

/// Check the stamped checksum against the contents.
pub fn verify_checksum(message: &MessageBuffer) -> Result<()> {
    let expected = compute_checksum(message);
    let found = message.header().checksum();
    if expected != found {
        return Err(Error::ChecksumMismatch { expected, found });
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn fold(digest: u64) -> u16 {
    (digest ^ (digest >> 16) ^ (digest >> 32) ^ (digest >> 48)) as u16
}
