//! Message buffer: one allocation holding a wire header and its packed records

use std::fmt;

use bytes::Bytes;
use tracing::trace;

use super::record::zeroed;
use super::{
    Error, HEADER_SIZE, MAX_MESSAGE_LEN, RECORD_HEADER_SIZE, RecordCursor, RecordRef, Result,
    WireHeader, WireRecord,
};

/// Header plus record region in a single contiguous allocation.
///
/// `header.len` always equals the allocation size; the record region is
/// everything after the first [`HEADER_SIZE`] bytes. A buffer is not
/// `Clone`: it moves between envelopes, it is never duplicated.
#[derive(PartialEq, Eq)]
pub struct MessageBuffer {
    data: Vec<u8>,
}

impl MessageBuffer {
    /// Allocate a zero-filled buffer of `size` bytes (header included).
    pub fn create(size: usize) -> Result<Self> {
        if size < HEADER_SIZE {
            return Err(Error::invalid(
                "size",
                format!("{size} is below header size {HEADER_SIZE}"),
            ));
        }
        if size > MAX_MESSAGE_LEN {
            return Err(Error::invalid(
                "size",
                format!("{size} exceeds maximum {MAX_MESSAGE_LEN}"),
            ));
        }

        let mut buffer = Self { data: zeroed(size)? };
        let mut header = WireHeader::default();
        header.set_len(to_wire_len(size))?;
        header.write_to(&mut buffer.data);
        Ok(buffer)
    }

    /// Wrap bytes whose header has already been validated against their length.
    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        debug_assert!(data.len() >= HEADER_SIZE);
        Self { data }
    }

    /// Decoded copy of the header.
    #[must_use]
    pub fn header(&self) -> WireHeader {
        WireHeader::read_from(&self.data)
    }

    /// Edit header fields in place.
    ///
    /// The length field belongs to the buffer: whatever the closure does to
    /// it is overwritten with the allocation size. If the closure fails the
    /// header is left untouched.
    pub fn update_header<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut WireHeader) -> Result<()>,
    {
        let mut header = self.header();
        edit(&mut header)?;
        header.set_len(to_wire_len(self.data.len()))?;
        header.write_to(&mut self.data);
        Ok(())
    }

    /// Raw priority from the header.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.header().priority()
    }

    /// Set the header priority (0..=4).
    pub fn set_priority(&mut self, priority: u8) -> Result<()> {
        self.update_header(|header| header.set_priority(priority))
    }

    /// Destination node id, as read by the routing layer.
    #[must_use]
    pub fn dst_id(&self) -> u32 {
        self.header().dst_id()
    }

    /// Total length in bytes (`header.len`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// A buffer always holds at least its header.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whole message as it goes on the wire.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view used by the codec to stamp checksums.
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes following the header.
    #[must_use]
    pub fn region(&self) -> &[u8] {
        &self.data[HEADER_SIZE..]
    }

    /// Walk the packed records.
    #[must_use]
    pub fn records(&self) -> RecordCursor<'_> {
        RecordCursor::new(self.region())
    }

    /// Number of records before the sentinel or the end of the region.
    ///
    /// A malformed record ends the count.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records().take_while(Result::is_ok).count()
    }

    /// Region bytes occupied by records.
    pub fn used_len(&self) -> Result<usize> {
        self.scan_used()
    }

    /// Region bytes available to further records (overhead included).
    pub fn free_len(&self) -> Result<usize> {
        Ok(self.region().len() - self.used_len()?)
    }

    /// Last record before the sentinel.
    ///
    /// Fails [`Error::NotFound`] when the buffer holds no records and
    /// [`Error::MalformedRecord`] when the walk overruns the region.
    pub fn last_record(&self) -> Result<RecordRef<'_>> {
        let mut last = None;
        for record in self.records() {
            last = Some(record?);
        }
        last.ok_or_else(|| Error::not_found("record"))
    }

    /// Copy `record` into the first free slot.
    ///
    /// Fails [`Error::OutOfRange`] when it does not fit; the buffer is left
    /// unchanged in that case.
    pub fn append_record(&mut self, record: &WireRecord) -> Result<()> {
        let region_len = self.region().len();
        let needed = record.encoded_len();
        if needed > region_len {
            return Err(Error::out_of_range(
                "record",
                needed as u64,
                region_len as u64,
            ));
        }

        let used = self.scan_used()?;
        if used + needed > region_len {
            return Err(Error::out_of_range(
                "record region",
                (used + needed) as u64,
                region_len as u64,
            ));
        }

        let start = HEADER_SIZE + used;
        let end = start + needed;
        record.write_to(&mut self.data[start..end]);

        // Keep the walk terminated even if stale bytes follow.
        if self.data.len() - end >= RECORD_HEADER_SIZE {
            self.data[end..end + RECORD_HEADER_SIZE].fill(0);
        }
        Ok(())
    }

    /// Grow the allocation by `extra` bytes.
    ///
    /// The new tail is zero-filled free space; use [`append_record`](Self::append_record)
    /// to place records in it.
    pub fn expand(&mut self, extra: usize) -> Result<()> {
        if extra == 0 {
            return Err(Error::invalid("extra", "expansion must be non-zero"));
        }
        let Some(new_len) = self
            .data
            .len()
            .checked_add(extra)
            .filter(|len| *len <= MAX_MESSAGE_LEN)
        else {
            return Err(Error::out_of_range(
                "message length",
                (self.data.len() as u64).saturating_add(extra as u64),
                MAX_MESSAGE_LEN as u64,
            ));
        };

        self.data
            .try_reserve_exact(extra)
            .map_err(|_| Error::OutOfMemory { requested: new_len })?;
        self.data.resize(new_len, 0);
        self.write_len();
        trace!(len = new_len, extra, "expanded message buffer");
        Ok(())
    }

    /// Shrink the allocation by `removed` bytes.
    ///
    /// The cut must not split a record: the new end has to fall in free space
    /// or exactly on a record boundary, in which case the trailing records are
    /// dropped whole. Splitting a record fails [`Error::InvalidArgument`].
    pub fn truncate(&mut self, removed: usize) -> Result<()> {
        let len = self.data.len();
        if removed > len {
            return Err(Error::out_of_range("truncate", removed as u64, len as u64));
        }
        let new_len = len - removed;
        if new_len < HEADER_SIZE {
            return Err(Error::out_of_range(
                "truncate",
                removed as u64,
                (len - HEADER_SIZE) as u64,
            ));
        }

        let new_region = new_len - HEADER_SIZE;
        for record in self.records() {
            let record = record?;
            if record.offset() < new_region && new_region < record.end() {
                return Err(Error::invalid(
                    "removed",
                    format!(
                        "cut at region offset {new_region} splits record spanning {}..{}",
                        record.offset(),
                        record.end()
                    ),
                ));
            }
        }

        self.data.truncate(new_len);
        self.data.shrink_to_fit();
        self.write_len();
        trace!(len = new_len, removed, "truncated message buffer");
        Ok(())
    }

    /// Encode message to bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        super::encode(self)
    }

    /// Decode message from bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        super::decode(bytes)
    }

    /// Hand the allocation over as `Bytes` without copying.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    /// Free the allocation.
    pub fn release(self) {
        trace!(len = self.data.len(), "released message buffer");
    }

    /// Region offset where the next record would go.
    fn scan_used(&self) -> Result<usize> {
        let mut used = 0;
        for record in self.records() {
            used = record?.end();
        }
        Ok(used)
    }

    fn write_len(&mut self) {
        let len = to_wire_len(self.data.len());
        self.data[12..14].copy_from_slice(&len.to_le_bytes());
    }
}

impl fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("header", &self.header())
            .field("records", &self.record_count())
            .finish()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_wire_len(len: usize) -> u16 {
    debug_assert!(len <= MAX_MESSAGE_LEN);
    len as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HEART_RATE_DEFAULT;

    fn hello_record(size: u16) -> WireRecord {
        let mut record = WireRecord::new(1, size).unwrap();
        record.reset_data(b"hello world", size).unwrap();
        record
    }

    #[test]
    fn test_create_sets_len_and_defaults() {
        let buffer = MessageBuffer::create(HEADER_SIZE + 1024).unwrap();
        let header = buffer.header();
        assert_eq!(usize::from(header.len()), HEADER_SIZE + 1024);
        assert_eq!(header.heart_rate(), HEART_RATE_DEFAULT);
        assert_eq!(buffer.record_count(), 0);
        assert!(buffer.region().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_create_rejects_bad_sizes() {
        assert!(matches!(
            MessageBuffer::create(HEADER_SIZE - 1),
            Err(Error::InvalidArgument { field: "size", .. })
        ));
        assert!(MessageBuffer::create(MAX_MESSAGE_LEN + 1).is_err());
        assert_eq!(MessageBuffer::create(HEADER_SIZE).unwrap().record_count(), 0);
    }

    #[test]
    fn test_fill_then_overflow() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 1024).unwrap();
        let record = hello_record(1016);

        buffer.append_record(&record).unwrap();
        assert_eq!(buffer.len(), HEADER_SIZE + 1024);
        assert_eq!(buffer.record_count(), 1);

        let last = buffer.last_record().unwrap();
        assert_eq!(last.record_type(), 1);
        assert_eq!(last.len(), 1016);
        assert_eq!(&last.data()[..11], b"hello world");

        let before = buffer.as_bytes().to_vec();
        assert!(matches!(
            buffer.append_record(&record),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(buffer.as_bytes(), &before[..]);
    }

    #[test]
    fn test_record_larger_than_region() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 8).unwrap();
        let record = WireRecord::new(1, 8).unwrap();
        assert!(matches!(
            buffer.append_record(&record),
            Err(Error::OutOfRange { what: "record", needed: 12, limit: 8 })
        ));
    }

    #[test]
    fn test_records_pack_back_to_back() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 64).unwrap();
        buffer
            .append_record(&WireRecord::with_payload(1, b"ab".to_vec()).unwrap())
            .unwrap();
        buffer
            .append_record(&WireRecord::with_payload(2, b"cde".to_vec()).unwrap())
            .unwrap();

        assert_eq!(buffer.record_count(), 2);
        assert_eq!(buffer.used_len().unwrap(), 13);
        assert_eq!(buffer.free_len().unwrap(), 51);
        let last = buffer.last_record().unwrap();
        assert_eq!(last.offset(), 6);
        assert_eq!(last.data(), b"cde");
    }

    #[test]
    fn test_last_record_on_empty_buffer() {
        let buffer = MessageBuffer::create(HEADER_SIZE + 32).unwrap();
        assert!(matches!(
            buffer.last_record(),
            Err(Error::NotFound { what: "record" })
        ));
    }

    #[test]
    fn test_expand_then_truncate_restores_len() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 1024).unwrap();
        buffer.append_record(&hello_record(1016)).unwrap();

        buffer.expand(1024).unwrap();
        assert_eq!(usize::from(buffer.header().len()), HEADER_SIZE + 2048);
        assert_eq!(buffer.record_count(), 1);

        buffer.truncate(1024).unwrap();
        assert_eq!(usize::from(buffer.header().len()), HEADER_SIZE + 1024);
        assert_eq!(&buffer.last_record().unwrap().data()[..11], b"hello world");
    }

    #[test]
    fn test_expand_makes_room_for_another_record() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 1024).unwrap();
        let record = hello_record(1016);
        buffer.append_record(&record).unwrap();
        buffer.expand(1024).unwrap();
        buffer.append_record(&record).unwrap();
        assert_eq!(buffer.record_count(), 2);
    }

    #[test]
    fn test_expand_rejects_zero_and_overflow() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE).unwrap();
        assert!(matches!(
            buffer.expand(0),
            Err(Error::InvalidArgument { field: "extra", .. })
        ));
        assert!(matches!(
            buffer.expand(MAX_MESSAGE_LEN),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(buffer.len(), HEADER_SIZE);
    }

    #[test]
    fn test_expand_rejects_wrapping_length() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 8).unwrap();
        assert!(matches!(
            buffer.expand(usize::MAX),
            Err(Error::OutOfRange { what: "message length", needed: u64::MAX, .. })
        ));
        assert_eq!(buffer.len(), HEADER_SIZE + 8);
        assert_eq!(usize::from(buffer.header().len()), HEADER_SIZE + 8);
    }

    #[test]
    fn test_truncate_refuses_to_split_record() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 1024).unwrap();
        let record = hello_record(1016);
        buffer.append_record(&record).unwrap();
        buffer.expand(1024).unwrap();
        buffer.append_record(&record).unwrap();

        // second record spans 1020..2040; cutting to 1024 would split it
        assert!(matches!(
            buffer.truncate(1024),
            Err(Error::InvalidArgument { field: "removed", .. })
        ));
        assert_eq!(buffer.record_count(), 2);

        // cutting exactly at its start drops it whole
        buffer.truncate(1028).unwrap();
        assert_eq!(buffer.record_count(), 1);
        assert_eq!(buffer.free_len().unwrap(), 0);
    }

    #[test]
    fn test_truncate_bounds() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 8).unwrap();
        assert!(matches!(
            buffer.truncate(HEADER_SIZE + 9),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(buffer.truncate(9), Err(Error::OutOfRange { .. })));
        buffer.truncate(8).unwrap();
        assert_eq!(buffer.len(), HEADER_SIZE);
    }

    #[test]
    fn test_update_header_keeps_len() {
        let mut buffer = MessageBuffer::create(HEADER_SIZE + 4).unwrap();
        buffer
            .update_header(|header| {
                header.set_dst_id(42);
                header.set_len(64)
            })
            .unwrap();
        assert_eq!(buffer.dst_id(), 42);
        assert_eq!(usize::from(buffer.header().len()), HEADER_SIZE + 4);

        assert!(buffer.set_priority(9).is_err());
        assert_eq!(buffer.priority(), 0);
    }
}
