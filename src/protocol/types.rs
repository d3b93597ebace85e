//! Wire priority levels

use std::fmt;

use super::{Error, PRIORITY_MAX, Result};

/// Traffic priority carried in the 3-bit header field.
///
/// Higher values select higher queue indices in a [`QueueSet`](crate::QueueSet).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    /// Background traffic
    #[default]
    Low = 0,
    /// Level 1
    Level1 = 1,
    /// Level 2
    Level2 = 2,
    /// Level 3
    Level3 = 3,
    /// Most urgent traffic
    Level4 = 4,
}

impl Priority {
    /// All levels, lowest first.
    pub const ALL: [Self; 5] = [
        Self::Low,
        Self::Level1,
        Self::Level2,
        Self::Level3,
        Self::Level4,
    ];

    /// Convert from the raw field value
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::Level1),
            2 => Some(Self::Level2),
            3 => Some(Self::Level3),
            4 => Some(Self::Level4),
            _ => None,
        }
    }

    /// Convert to the raw field value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or_else(|| {
            Error::invalid("priority", format!("{value} exceeds maximum {PRIORITY_MAX}"))
        })
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.as_u8()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Level1 => "level1",
            Self::Level2 => "level2",
            Self::Level3 => "level3",
            Self::Level4 => "level4",
        };
        write!(f, "{name}")
    }
}
