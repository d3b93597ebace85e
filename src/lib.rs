//! Hopwire - message buffer codec and priority queueing for mesh nodes
//!
//! A message is a 16-byte packed header followed by type-length-value records
//! in one contiguous, resizable buffer. Buffers travel in envelopes through
//! bounded FIFO queues; a queue set routes each envelope by the priority in
//! its header.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hopwire::{Envelope, HEADER_SIZE, MessageBuffer, QueueSet, WireRecord};
//!
//! // Build a message with one record
//! let mut message = MessageBuffer::create(HEADER_SIZE + 64)?;
//! message.set_priority(1)?;
//! message.append_record(&WireRecord::with_payload(1, &b"hello world"[..])?)?;
//!
//! // Hand it to the queues
//! let mut envelope = Envelope::new();
//! envelope.bind(message, 1)?;
//! let mut queues = QueueSet::new(2)?;
//! let index = queues.dispatch(envelope)?;
//!
//! // Consume it on the other side
//! let mut received = queues.take(index)?;
//! let message = received.unbind().expect("bound envelope");
//! assert_eq!(message.last_record()?.data(), b"hello world");
//! # Ok::<(), hopwire::Error>(())
//! ```
//!
//! # Features
//!
//! - **Bounds-checked record walking** - malformed records surface as errors
//! - **Ownership handback** - refused envelopes and buffers return to the caller
//! - **Built-in checksums** - `XXHash3` folded to the 16-bit header field
//! - **Admission caps** - per-queue envelope count and byte limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod queue;

pub use protocol::{
    Error, HEADER_SIZE, MessageBuffer, MetricsSnapshot, Priority, RECORD_HEADER_SIZE, Result,
    WireHeader, WireRecord, metrics_snapshot,
};
pub use queue::{Envelope, PipeTable, PriorityQueue, QueueSet, Rejected};

/// Wire format version
pub const VERSION: &str = "0.1.0";
