//! Queue configuration options.

use crate::protocol::{Error, PRIORITY_LEVELS, Result};

use super::RxMode;

/// Largest number of envelopes a single queue may hold.
pub const MAX_QUEUE_COUNT: u16 = 0xFFFF;

/// Largest number of buffer bytes a single queue may hold.
pub const MAX_QUEUE_BYTES: u32 = 0xFFFF_FFFF;

/// Receive queues per pipe unless configured otherwise.
pub const DEFAULT_RX_QUEUES: usize = 2;

/// Transmit queues per pipe unless configured otherwise.
pub const DEFAULT_TX_QUEUES: usize = 2;

/// Admission caps applied by a [`PriorityQueue`](super::PriorityQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueLimits {
    /// Maximum number of queued envelopes.
    pub max_count: u16,
    /// Maximum sum of queued buffer lengths.
    pub max_bytes: u32,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self {
            max_count: MAX_QUEUE_COUNT,
            max_bytes: MAX_QUEUE_BYTES,
        }
    }
}

/// Shape of a [`QueueSet`](super::QueueSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueSetConfig {
    /// Number of priority queues (1..=5).
    pub queue_count: usize,
    /// Caps applied to every queue in the set.
    pub limits: QueueLimits,
    /// Initial receive mode of every queue.
    pub rx_mode: RxMode,
}

impl QueueSetConfig {
    /// Config with `queue_count` queues and default caps.
    #[must_use]
    pub fn with_queue_count(queue_count: usize) -> Self {
        Self {
            queue_count,
            ..Self::default()
        }
    }

    /// Check the queue count against the number of wire priorities.
    pub fn validate(&self) -> Result<()> {
        if self.queue_count == 0 || self.queue_count > PRIORITY_LEVELS {
            return Err(Error::invalid(
                "queue_count",
                format!("{} outside 1..={PRIORITY_LEVELS}", self.queue_count),
            ));
        }
        Ok(())
    }
}

impl Default for QueueSetConfig {
    fn default() -> Self {
        Self {
            queue_count: DEFAULT_RX_QUEUES,
            limits: QueueLimits::default(),
            rx_mode: RxMode::default(),
        }
    }
}

/// Receive and transmit queue sets of a [`Pipe`](super::Pipe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipeConfig {
    /// Inbound queues.
    pub rx: QueueSetConfig,
    /// Outbound queues.
    pub tx: QueueSetConfig,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            rx: QueueSetConfig::with_queue_count(DEFAULT_RX_QUEUES),
            tx: QueueSetConfig::with_queue_count(DEFAULT_TX_QUEUES),
        }
    }
}
