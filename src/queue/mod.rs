//! Queueing layer: envelopes, bounded priority queues, queue sets and pipes.

mod config;
mod dispatch;
mod envelope;
mod error;
mod pipe;
mod priority;

pub use config::{
    DEFAULT_RX_QUEUES, DEFAULT_TX_QUEUES, MAX_QUEUE_BYTES, MAX_QUEUE_COUNT, PipeConfig,
    QueueLimits, QueueSetConfig,
};
pub use dispatch::QueueSet;
pub use envelope::Envelope;
pub use error::Rejected;
pub use pipe::{PIPE_ID_MAX, Pipe, PipeKind, PipeTable};
pub use priority::{PriorityQueue, QueueConfig, QueueStats, RxMode};
