//! Fixed set of priority queues fed by buffer priority.

use tracing::trace;

use crate::protocol::metrics::Metrics;
use crate::protocol::{Error, MessageBuffer, Result};

use super::{Envelope, PriorityQueue, QueueSetConfig, Rejected};

/// One to five priority queues; envelopes land in the queue their buffer's
/// priority selects.
#[derive(Debug)]
pub struct QueueSet {
    queues: Box<[PriorityQueue]>,
}

impl QueueSet {
    /// Create `queue_count` empty queues with default caps.
    pub fn new(queue_count: usize) -> Result<Self> {
        Self::with_config(&QueueSetConfig::with_queue_count(queue_count))
    }

    /// Create a queue set from `config`.
    pub fn with_config(config: &QueueSetConfig) -> Result<Self> {
        config.validate()?;
        let queues = (0..config.queue_count)
            .map(|index| {
                // validate() bounds queue_count by the priority levels
                #[allow(clippy::cast_possible_truncation)]
                let mut queue = PriorityQueue::with_limits(index as u8, config.limits);
                queue.set_rx_mode(config.rx_mode);
                queue
            })
            .collect();
        Ok(Self { queues })
    }

    /// Enqueue `envelope` into the queue its priority selects.
    ///
    /// Returns the chosen index, or the envelope with the queue's refusal.
    pub fn dispatch(
        &mut self,
        envelope: Envelope,
    ) -> std::result::Result<usize, Rejected<Envelope>> {
        let index = envelope.select_queue(self.queues.len());
        trace!(envelope = envelope.id(), index, "dispatch envelope");
        self.queues[index].enqueue(envelope)?;
        Metrics::record_dispatch(index);
        Ok(index)
    }

    /// Dequeue the head of queue `index`.
    pub fn take(&mut self, index: usize) -> Result<Envelope> {
        let queue_count = self.queues.len();
        self.queues
            .get_mut(index)
            .ok_or_else(|| index_error(index, queue_count))?
            .dequeue()
    }

    /// Queue at `index`.
    #[must_use]
    pub fn queue(&self, index: usize) -> Option<&PriorityQueue> {
        self.queues.get(index)
    }

    /// Mutable queue at `index`.
    pub fn queue_mut(&mut self, index: usize) -> Option<&mut PriorityQueue> {
        self.queues.get_mut(index)
    }

    /// Iterate queues in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PriorityQueue> {
        self.queues.iter()
    }

    /// Number of queues
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Always false; a set holds at least one queue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Envelopes queued across the set.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.queues.iter().map(|queue| usize::from(queue.count())).sum()
    }

    /// Buffer bytes queued across the set.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.queues.iter().map(|queue| u64::from(queue.bytes())).sum()
    }

    /// Destroy every queue and return their buffers in index order.
    pub fn destroy(self) -> Vec<MessageBuffer> {
        self.queues
            .into_vec()
            .into_iter()
            .flat_map(PriorityQueue::destroy)
            .collect()
    }
}

fn index_error(index: usize, queue_count: usize) -> Error {
    Error::invalid("index", format!("queue {index} outside set of {queue_count}"))
}
