//! TLV records and the bounds-checked cursor that walks them
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             Type              |            Length             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      Data (Length bytes) ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Records are packed back to back. A record whose length is zero marks the
//! end of the sequence, so zero-payload records cannot be built.

use bytes::Bytes;

use super::{Error, MAX_RECORD_LEN, RECORD_HEADER_SIZE, Result};

/// Owned TLV record ready to be appended to a [`MessageBuffer`](super::MessageBuffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    record_type: u16,
    data: Bytes,
}

impl WireRecord {
    /// Allocate a record with a zero-filled payload of `size` bytes.
    pub fn new(record_type: u16, size: u16) -> Result<Self> {
        check_payload_len(usize::from(size))?;
        let data = zeroed(usize::from(size))?;
        Ok(Self {
            record_type,
            data: Bytes::from(data),
        })
    }

    /// Build a record around an existing payload.
    pub fn with_payload(record_type: u16, payload: impl Into<Bytes>) -> Result<Self> {
        let data = payload.into();
        check_payload_len(data.len())?;
        Ok(Self { record_type, data })
    }

    /// Get record type
    #[must_use]
    pub const fn record_type(&self) -> u16 {
        self.record_type
    }

    /// Set record type
    pub fn set_type(&mut self, record_type: u16) {
        self.record_type = record_type;
    }

    /// Payload length
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u16 {
        // bounded by check_payload_len
        self.data.len() as u16
    }

    /// Always false: empty payloads are rejected on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload bytes
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Bytes the record occupies once packed.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.data.len()
    }

    /// Reallocate the payload to `size` bytes and copy `payload` into it.
    ///
    /// `payload` may be shorter than `size`; the remainder is zero padding.
    /// A payload longer than `size` is rejected rather than cut.
    pub fn reset_data(&mut self, payload: &[u8], size: u16) -> Result<()> {
        let size = usize::from(size);
        check_payload_len(size)?;
        if payload.len() > size {
            return Err(Error::invalid(
                "payload",
                format!("{} bytes do not fit in {size}", payload.len()),
            ));
        }

        let mut data = zeroed(size)?;
        data[..payload.len()].copy_from_slice(payload);
        self.data = Bytes::from(data);
        Ok(())
    }

    /// Pack into the front of `out`, which must hold [`encoded_len`](Self::encoded_len) bytes.
    pub(crate) fn write_to(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.record_type.to_le_bytes());
        out[2..4].copy_from_slice(&self.len().to_le_bytes());
        out[RECORD_HEADER_SIZE..self.encoded_len()].copy_from_slice(&self.data);
    }
}

/// Borrowed view of a record inside a buffer's record region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef<'a> {
    record_type: u16,
    offset: usize,
    data: &'a [u8],
}

impl<'a> RecordRef<'a> {
    /// Record type
    #[must_use]
    pub const fn record_type(&self) -> u16 {
        self.record_type
    }

    /// Payload length
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u16 {
        self.data.len() as u16
    }

    /// Never true for records yielded by a cursor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload bytes
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Offset of the record's type field within the record region.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Offset one past the record's last payload byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + RECORD_HEADER_SIZE + self.data.len()
    }

    /// Copy into an owned record.
    #[must_use]
    pub fn to_record(&self) -> WireRecord {
        WireRecord {
            record_type: self.record_type,
            data: Bytes::copy_from_slice(self.data),
        }
    }
}

/// Cursor over a packed record region.
///
/// Iteration ends at the zero-length sentinel, when the region is exhausted,
/// or when fewer than [`RECORD_HEADER_SIZE`] bytes remain. A record whose
/// declared length runs past the region yields [`Error::MalformedRecord`]
/// and ends iteration.
#[derive(Debug, Clone)]
pub struct RecordCursor<'a> {
    region: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> RecordCursor<'a> {
    /// Start walking `region` from its first byte.
    #[must_use]
    pub const fn new(region: &'a [u8]) -> Self {
        Self {
            region,
            offset: 0,
            done: false,
        }
    }

    /// Offset just past the last record yielded.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for RecordCursor<'a> {
    type Item = Result<RecordRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let remaining = self.region.len() - self.offset;
        if remaining < RECORD_HEADER_SIZE {
            self.done = true;
            return None;
        }

        let at = self.offset;
        let record_type = u16::from_le_bytes([self.region[at], self.region[at + 1]]);
        let len = usize::from(u16::from_le_bytes([self.region[at + 2], self.region[at + 3]]));
        if len == 0 {
            self.done = true;
            return None;
        }

        let declared = RECORD_HEADER_SIZE + len;
        if declared > remaining {
            self.done = true;
            return Some(Err(Error::MalformedRecord {
                offset: at,
                declared,
                available: remaining,
            }));
        }

        let start = at + RECORD_HEADER_SIZE;
        self.offset = at + declared;
        Some(Ok(RecordRef {
            record_type,
            offset: at,
            data: &self.region[start..start + len],
        }))
    }
}

fn check_payload_len(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::invalid(
            "len",
            "zero-length records are reserved as the end-of-records sentinel",
        ));
    }
    if len > MAX_RECORD_LEN {
        return Err(Error::invalid(
            "len",
            format!("{len} exceeds maximum {MAX_RECORD_LEN}"),
        ));
    }
    Ok(())
}

/// Zero-filled allocation that reports failure instead of aborting.
pub(crate) fn zeroed(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { requested: len })?;
    data.resize(len, 0);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(records: &[(u16, &[u8])], region_len: usize) -> Vec<u8> {
        let mut region = vec![0u8; region_len];
        let mut offset = 0;
        for (record_type, payload) in records {
            let record = WireRecord::with_payload(*record_type, payload.to_vec()).unwrap();
            record.write_to(&mut region[offset..]);
            offset += record.encoded_len();
        }
        region
    }

    #[test]
    fn test_new_record_is_zero_filled() {
        let record = WireRecord::new(7, 32).unwrap();
        assert_eq!(record.record_type(), 7);
        assert_eq!(record.len(), 32);
        assert!(record.data().iter().all(|b| *b == 0));
        assert_eq!(record.encoded_len(), 36);
    }

    #[test]
    fn test_zero_length_record_rejected() {
        assert!(matches!(
            WireRecord::new(1, 0),
            Err(Error::InvalidArgument { field: "len", .. })
        ));
        assert!(WireRecord::with_payload(1, Vec::new()).is_err());
    }

    #[test]
    fn test_reset_data_pads_short_payload() {
        let mut record = WireRecord::new(1, 4).unwrap();
        record.reset_data(b"hello world", 1016).unwrap();
        assert_eq!(record.len(), 1016);
        assert_eq!(&record.data()[..11], b"hello world");
        assert!(record.data()[11..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_reset_data_rejects_oversized_payload() {
        let mut record = WireRecord::with_payload(1, b"abcd".to_vec()).unwrap();
        let result = record.reset_data(b"hello world", 4);
        assert!(matches!(result, Err(Error::InvalidArgument { field: "payload", .. })));
        assert_eq!(record.data().as_ref(), b"abcd");
    }

    #[test]
    fn test_cursor_stops_at_sentinel() {
        let region = packed(&[(1, b"abc"), (2, b"defgh")], 64);
        let records: Vec<_> = RecordCursor::new(&region).map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type(), 1);
        assert_eq!(records[0].data(), b"abc");
        assert_eq!(records[1].offset(), 7);
        assert_eq!(records[1].end(), 16);
    }

    #[test]
    fn test_cursor_stops_at_exhaustion() {
        let region = packed(&[(1, b"abcd")], 8);
        let mut cursor = RecordCursor::new(&region);
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().is_none());
        assert_eq!(cursor.offset(), 8);
    }

    #[test]
    fn test_cursor_ignores_short_tail() {
        let mut region = packed(&[(1, b"ab")], 9);
        region[6..9].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(RecordCursor::new(&region).count(), 1);
    }

    #[test]
    fn test_cursor_reports_overrun() {
        let mut region = vec![0u8; 12];
        region[0..2].copy_from_slice(&9u16.to_le_bytes());
        region[2..4].copy_from_slice(&100u16.to_le_bytes());

        let mut cursor = RecordCursor::new(&region);
        assert!(matches!(
            cursor.next(),
            Some(Err(Error::MalformedRecord {
                offset: 0,
                declared: 104,
                available: 12
            }))
        ));
        assert!(cursor.next().is_none());
    }
}
