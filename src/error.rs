//! Error types for the table.
//!
//! Absent keys are not errors; lookups return `None`. The only runtime
//! failure is running out of memory while growing or copying a key.

use core::fmt;
use thiserror::Error;

/// Result type alias using `TableError`.
pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// A slot array or key copy could not be reserved, or the requested
    /// size overflowed.
    #[error("allocation failure: could not reserve {requested} elements")]
    AllocationFailure { requested: usize },

    /// Resize target cannot hold the live entries.
    #[error("invalid capacity {requested}: table holds {count} entries")]
    InvalidCapacity { requested: usize, count: usize },

    #[error("invalid table configuration: {0}")]
    InvalidConfig(String),
}

/// Failed `put`. Carries the value back so the caller keeps ownership.
pub struct PutError<V> {
    value: V,
    error: TableError,
}

impl<V> PutError<V> {
    pub(crate) fn new(value: V, error: TableError) -> Self {
        Self { value, error }
    }

    pub fn error(&self) -> &TableError {
        &self.error
    }

    /// Recover the value that was not stored.
    pub fn into_value(self) -> V {
        self.value
    }

    pub fn into_parts(self) -> (V, TableError) {
        (self.value, self.error)
    }
}

impl<V> fmt::Debug for PutError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<V> fmt::Display for PutError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put failed: {}", self.error)
    }
}

impl<V> std::error::Error for PutError<V> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<V> From<PutError<V>> for TableError {
    fn from(e: PutError<V>) -> Self {
        e.error
    }
}
