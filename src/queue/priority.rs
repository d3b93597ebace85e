//! Bounded FIFO of envelopes with count and byte accounting.

use std::collections::VecDeque;
use std::fmt;

use tracing::trace;

use crate::protocol::metrics::{Metrics, Rejection};
use crate::protocol::{Error, MessageBuffer, Result};

use super::{Envelope, QueueLimits, Rejected};

/// How a queue hands out received envelopes.
///
/// Carried as configuration only; the queue itself is always FIFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RxMode {
    /// Zero-copy receive
    Zero = 0,
    /// Half-copy receive
    #[default]
    Half = 1,
    /// Full-copy receive
    Full = 2,
}

impl RxMode {
    /// Raw mode value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RxMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::Half),
            2 => Ok(Self::Full),
            other => Err(Error::invalid("rx_mode", format!("{other} is not 0, 1 or 2"))),
        }
    }
}

impl fmt::Display for RxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zero => "zero",
            Self::Half => "half",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

/// Identity and mode of a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueConfig {
    /// Queue id
    pub id: u8,
    /// Receive mode
    pub rx_mode: RxMode,
}

/// Running totals of a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Queued envelopes
    pub count: u16,
    /// Sum of queued buffer lengths
    pub bytes: u32,
}

/// Bounded FIFO of bound envelopes.
///
/// `stats.count` always equals the number of queued envelopes and
/// `stats.bytes` the sum of their buffer lengths. Admission refuses unbound
/// envelopes and anything that would push either total past its cap.
#[derive(Debug)]
pub struct PriorityQueue {
    entries: VecDeque<Envelope>,
    config: QueueConfig,
    stats: QueueStats,
    limits: QueueLimits,
}

impl PriorityQueue {
    /// Create an empty queue with default caps.
    #[must_use]
    pub fn new(id: u8) -> Self {
        Self::with_limits(id, QueueLimits::default())
    }

    /// Create an empty queue with the given caps.
    #[must_use]
    pub fn with_limits(id: u8, limits: QueueLimits) -> Self {
        Self {
            entries: VecDeque::new(),
            config: QueueConfig {
                id,
                rx_mode: RxMode::default(),
            },
            stats: QueueStats::default(),
            limits,
        }
    }

    /// Admit `envelope` at the tail.
    ///
    /// On failure nothing changes and the envelope is handed back:
    /// [`Error::Empty`] if it has no buffer, [`Error::OutOfRange`] if the
    /// count or byte cap would be exceeded.
    pub fn enqueue(&mut self, envelope: Envelope) -> std::result::Result<(), Rejected<Envelope>> {
        let Some(len) = envelope.wire_len() else {
            Metrics::record_rejection(Rejection::Empty);
            return Err(Rejected::new(Error::empty("envelope"), envelope));
        };

        if self.stats.count >= self.limits.max_count {
            Metrics::record_rejection(Rejection::Count);
            return Err(Rejected::new(
                Error::out_of_range(
                    "queue count",
                    u64::from(self.stats.count) + 1,
                    u64::from(self.limits.max_count),
                ),
                envelope,
            ));
        }

        let needed = u64::from(self.stats.bytes) + u64::from(len);
        if needed > u64::from(self.limits.max_bytes) {
            Metrics::record_rejection(Rejection::Bytes);
            return Err(Rejected::new(
                Error::out_of_range("queue bytes", needed, u64::from(self.limits.max_bytes)),
                envelope,
            ));
        }

        self.stats.count += 1;
        self.stats.bytes += u32::from(len);
        trace!(
            queue = self.config.id,
            envelope = envelope.id(),
            len,
            count = self.stats.count,
            "enqueue envelope"
        );
        Metrics::record_admit(usize::from(len));
        self.entries.push_back(envelope);
        Ok(())
    }

    /// Remove and return the head envelope.
    pub fn dequeue(&mut self) -> Result<Envelope> {
        let envelope = self.entries.pop_front().ok_or(Error::empty("queue"))?;
        let len = envelope.wire_len().unwrap_or(0);
        self.stats.count -= 1;
        self.stats.bytes -= u32::from(len);
        trace!(
            queue = self.config.id,
            envelope = envelope.id(),
            len,
            count = self.stats.count,
            "dequeue envelope"
        );
        Metrics::record_dequeue(usize::from(len));
        Ok(envelope)
    }

    /// Head envelope without removing it.
    pub fn peek(&self) -> Result<&Envelope> {
        self.entries.front().ok_or(Error::empty("queue"))
    }

    /// Most recently admitted envelope.
    pub fn tail(&self) -> Result<&Envelope> {
        self.entries.back().ok_or(Error::empty("queue"))
    }

    /// Iterate queued envelopes head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Envelope> {
        self.entries.iter()
    }

    /// Queued envelopes
    #[must_use]
    pub const fn count(&self) -> u16 {
        self.stats.count
    }

    /// Sum of queued buffer lengths
    #[must_use]
    pub const fn bytes(&self) -> u32 {
        self.stats.bytes
    }

    /// Whether the queue holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue id
    #[must_use]
    pub const fn id(&self) -> u8 {
        self.config.id
    }

    /// Receive mode
    #[must_use]
    pub const fn rx_mode(&self) -> RxMode {
        self.config.rx_mode
    }

    /// Set receive mode
    pub fn set_rx_mode(&mut self, rx_mode: RxMode) {
        self.config.rx_mode = rx_mode;
    }

    /// Identity and mode
    #[must_use]
    pub const fn config(&self) -> QueueConfig {
        self.config
    }

    /// Running totals
    #[must_use]
    pub const fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Admission caps
    #[must_use]
    pub const fn limits(&self) -> QueueLimits {
        self.limits
    }

    /// Discard every envelope, unbinding it, and return the buffers.
    ///
    /// Discards are counted apart from dequeues. Dropping the returned
    /// buffers releases them.
    pub fn destroy(self) -> Vec<MessageBuffer> {
        let mut buffers = Vec::with_capacity(self.entries.len());
        for mut envelope in self.entries {
            if let Some(buffer) = envelope.unbind() {
                Metrics::record_discard(buffer.len());
                buffers.push(buffer);
            }
        }
        trace!(queue = self.config.id, released = buffers.len(), "destroy queue");
        buffers
    }
}
