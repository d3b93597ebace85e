//! Wire format core: packed header, TLV records and the message buffer built from them.

mod codec;
mod error;
mod header;
mod message;
pub(crate) mod metrics;
mod record;
mod types;

pub use codec::{compute_checksum, decode, encode, seal, verify_checksum};
pub use error::{Error, Result};
pub use header::WireHeader;
pub use message::MessageBuffer;
pub use metrics::{MetricsSnapshot, snapshot as metrics_snapshot};
pub use record::{RecordCursor, RecordRef, WireRecord};
pub use types::Priority;

/// Size of the packed wire header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Fixed per-record overhead (`type` + `len`) in bytes.
pub const RECORD_HEADER_SIZE: usize = 4;

/// Largest value `hop_limit` may carry.
pub const HOP_LIMIT_MAX: u8 = 0x80;

/// Largest value of the 2-bit `cfg` field.
pub const CFG_MAX: u8 = 3;

/// Largest wire priority.
pub const PRIORITY_MAX: u8 = 4;

/// Number of distinct wire priorities.
pub const PRIORITY_LEVELS: usize = PRIORITY_MAX as usize + 1;

/// Heart rate written into freshly created headers (seconds).
pub const HEART_RATE_DEFAULT: u16 = 60;

/// Largest total message length (`header.len`).
pub const MAX_MESSAGE_LEN: usize = 0xFFFF;

/// Largest record payload length.
pub const MAX_RECORD_LEN: usize = 0xFFFF;
