//! Ownership-preserving failure for operations that take an item by value.

use core::fmt;

use crate::protocol::Error;

/// An item handed back to the caller together with the reason it was refused.
///
/// Enqueueing an envelope or binding a buffer moves the item in; when the
/// operation fails the caller gets it back untouched instead of losing it.
pub struct Rejected<T> {
    error: Error,
    item: T,
}

impl<T> Rejected<T> {
    pub(crate) const fn new(error: Error, item: T) -> Self {
        Self { error, item }
    }

    /// Why the item was refused.
    #[must_use]
    pub const fn error(&self) -> &Error {
        &self.error
    }

    /// Recover the refused item.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Split into the error and the refused item.
    #[must_use]
    pub fn into_parts(self) -> (Error, T) {
        (self.error, self.item)
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected: {}", self.error)
    }
}

impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Rejected<T>> for Error {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}
