use std::sync::atomic::{AtomicU64, Ordering};

use super::PRIORITY_LEVELS;

/// Track queue admission metrics without external dependencies.
pub(crate) struct Metrics;

static ADMITTED: AtomicU64 = AtomicU64::new(0);
static DEQUEUED: AtomicU64 = AtomicU64::new(0);
static REJECTED_EMPTY: AtomicU64 = AtomicU64::new(0);
static REJECTED_COUNT: AtomicU64 = AtomicU64::new(0);
static REJECTED_BYTES: AtomicU64 = AtomicU64::new(0);
static BYTES_ADMITTED: AtomicU64 = AtomicU64::new(0);
static BYTES_DEQUEUED: AtomicU64 = AtomicU64::new(0);
static DISCARDED: AtomicU64 = AtomicU64::new(0);
static BYTES_DISCARDED: AtomicU64 = AtomicU64::new(0);

struct QueueIndexCounters {
    admitted: [AtomicU64; PRIORITY_LEVELS],
}

static INDEX_COUNTERS: QueueIndexCounters = QueueIndexCounters::new();

impl QueueIndexCounters {
    const fn new() -> Self {
        Self {
            admitted: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
        }
    }

    fn increment(&self, index: usize) {
        if let Some(counter) = self.admitted.get(index) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn load(&self) -> [u64; PRIORITY_LEVELS] {
        let mut values = [0u64; PRIORITY_LEVELS];
        for (value, counter) in values.iter_mut().zip(&self.admitted) {
            *value = counter.load(Ordering::Relaxed);
        }
        values
    }
}

/// Why an envelope was turned away at admission.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Rejection {
    /// No buffer bound
    Empty,
    /// Queue already holds its maximum number of envelopes
    Count,
    /// Admitting the buffer would exceed the byte cap
    Bytes,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_admit(bytes: usize) {
        ADMITTED.fetch_add(1, Ordering::Relaxed);
        BYTES_ADMITTED.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dequeue(bytes: usize) {
        DEQUEUED.fetch_add(1, Ordering::Relaxed);
        BYTES_DEQUEUED.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_discard(bytes: usize) {
        DISCARDED.fetch_add(1, Ordering::Relaxed);
        BYTES_DISCARDED.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejection(reason: Rejection) {
        let counter = match reason {
            Rejection::Empty => &REJECTED_EMPTY,
            Rejection::Count => &REJECTED_COUNT,
            Rejection::Bytes => &REJECTED_BYTES,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dispatch(index: usize) {
        INDEX_COUNTERS.increment(index);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: ADMITTED.load(Ordering::Relaxed),
            dequeued: DEQUEUED.load(Ordering::Relaxed),
            rejected_empty: REJECTED_EMPTY.load(Ordering::Relaxed),
            rejected_count: REJECTED_COUNT.load(Ordering::Relaxed),
            rejected_bytes: REJECTED_BYTES.load(Ordering::Relaxed),
            bytes_admitted: BYTES_ADMITTED.load(Ordering::Relaxed),
            bytes_dequeued: BYTES_DEQUEUED.load(Ordering::Relaxed),
            discarded: DISCARDED.load(Ordering::Relaxed),
            bytes_discarded: BYTES_DISCARDED.load(Ordering::Relaxed),
            dispatched_by_index: INDEX_COUNTERS.load(),
        }
    }
}

/// Process-wide snapshot of queue counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Envelopes admitted by any queue
    pub admitted: u64,
    /// Envelopes removed from any queue
    pub dequeued: u64,
    /// Admissions refused because no buffer was bound
    pub rejected_empty: u64,
    /// Admissions refused by the count cap
    pub rejected_count: u64,
    /// Admissions refused by the byte cap
    pub rejected_bytes: u64,
    /// Buffer bytes admitted
    pub bytes_admitted: u64,
    /// Buffer bytes dequeued
    pub bytes_dequeued: u64,
    /// Envelopes dropped by a queue teardown
    pub discarded: u64,
    /// Buffer bytes dropped by a queue teardown
    pub bytes_discarded: u64,
    /// Successful dispatches per queue index
    pub dispatched_by_index: [u64; PRIORITY_LEVELS],
}

impl MetricsSnapshot {
    /// Envelopes refused for any reason.
    #[must_use]
    pub fn total_rejected(&self) -> u64 {
        self.rejected_empty + self.rejected_count + self.rejected_bytes
    }

    /// Envelopes admitted and still queued, across all queues.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.admitted
            .saturating_sub(self.dequeued)
            .saturating_sub(self.discarded)
    }
}

/// Read the current counters.
#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    Metrics::totals()
}
