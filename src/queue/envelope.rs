//! Transit envelope binding metadata to at most one message buffer.

use std::time::SystemTime;

use uuid::Uuid;

use crate::protocol::{Error, MessageBuffer};

use super::Rejected;

/// Metadata wrapper a buffer travels in between queues.
///
/// While bound, the envelope is the buffer's only owner. Buffers move
/// between envelopes through [`unbind`](Self::unbind) then
/// [`bind`](Self::bind), or through [`rebind`](Self::rebind).
#[derive(Debug, Default)]
pub struct Envelope {
    id: u32,
    record_count: u8,
    timestamp: Option<SystemTime>,
    buffer: Option<MessageBuffer>,
}

impl Envelope {
    /// Create an unbound envelope with zeroed metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unbound envelope carrying a random id.
    #[must_use]
    pub fn with_generated_id() -> Self {
        Self {
            id: Self::generate_id(),
            ..Self::default()
        }
    }

    /// Envelope id
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Set envelope id
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Number of records the bound buffer was declared to carry.
    #[must_use]
    pub const fn record_count(&self) -> u8 {
        self.record_count
    }

    /// Set declared record count
    pub fn set_record_count(&mut self, record_count: u8) {
        self.record_count = record_count;
    }

    /// When the current buffer was bound, if any.
    #[must_use]
    pub const fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    /// Set timestamp
    pub fn set_timestamp(&mut self, timestamp: SystemTime) {
        self.timestamp = Some(timestamp);
    }

    /// Stamp the envelope with the current time.
    pub fn touch(&mut self) {
        self.timestamp = Some(SystemTime::now());
    }

    /// Whether a buffer is bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.buffer.is_some()
    }

    /// Bound buffer, if any.
    #[must_use]
    pub const fn buffer(&self) -> Option<&MessageBuffer> {
        self.buffer.as_ref()
    }

    /// Mutable bound buffer, if any.
    pub fn buffer_mut(&mut self) -> Option<&mut MessageBuffer> {
        self.buffer.as_mut()
    }

    /// Take ownership of `buffer`.
    ///
    /// Fails [`Error::InvalidArgument`] if a buffer is already bound; the
    /// offered buffer comes back inside the [`Rejected`].
    pub fn bind(
        &mut self,
        buffer: MessageBuffer,
        record_count: u8,
    ) -> Result<(), Rejected<MessageBuffer>> {
        if self.is_bound() {
            return Err(Rejected::new(
                Error::invalid("buffer", "envelope already holds a buffer"),
                buffer,
            ));
        }
        self.rebind(buffer, record_count);
        Ok(())
    }

    /// Bind `buffer` whether or not one is already bound.
    ///
    /// The previously bound buffer, if any, is returned; disposing of it is
    /// the caller's business.
    pub fn rebind(&mut self, buffer: MessageBuffer, record_count: u8) -> Option<MessageBuffer> {
        self.touch();
        self.record_count = record_count;
        self.buffer.replace(buffer)
    }

    /// Clear id, record count and timestamp and hand the buffer back without
    /// releasing it.
    pub fn unbind(&mut self) -> Option<MessageBuffer> {
        self.id = 0;
        self.record_count = 0;
        self.timestamp = None;
        self.buffer.take()
    }

    /// Queue index for this envelope in a set of `queue_count` queues.
    ///
    /// The buffer's priority selects the index, clamped to the last queue
    /// (`queue_count - 1`) when the set has fewer queues than priorities.
    /// Unbound envelopes and empty sets select 0.
    #[must_use]
    pub fn select_queue(&self, queue_count: usize) -> usize {
        match &self.buffer {
            Some(buffer) if queue_count > 0 => {
                usize::from(buffer.priority()).min(queue_count - 1)
            }
            _ => 0,
        }
    }

    /// Wire length of the bound buffer.
    pub(crate) fn wire_len(&self) -> Option<u16> {
        self.buffer.as_ref().map(|buffer| buffer.header().len())
    }

    /// Generate a random envelope id
    fn generate_id() -> u32 {
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}
