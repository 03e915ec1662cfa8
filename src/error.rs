//! Error types for the scrollcell engine.
//!
//! The core has almost no user-visible failure surface. Recognizers that
//! decline a gesture, adapters that report a stale count and animations that
//! stall for a few frames are all normal control flow. The errors here cover
//! the few public entry points that take a caller-supplied index or duration
//! and can therefore be handed a value that makes no sense.
//!
//! # Error Hierarchy
//!
//! - [`EngineError`] - index/duration/adapter misuse of the items engine
//! - [`crate::config::ConfigError`] - configuration file loading and validation
//! - [`crate::logging::LoggingError`] - tracing subscriber installation

use thiserror::Error;

/// Errors returned by fallible items-engine entry points.
///
/// # Examples
///
/// ```
/// use scrollcell::error::EngineError;
///
/// let err = EngineError::IndexOutOfRange { index: 12, len: 10 };
/// assert_eq!(err.to_string(), "Item index 12 out of range (len: 10)");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The item index does not address an existing cell.
    #[error("Item index {index} out of range (len: {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of cells at the time of the call.
        len: usize,
    },

    /// The group index does not address an existing group.
    #[error("Group index {group} out of range (len: {len})")]
    GroupOutOfRange {
        /// Requested group.
        group: usize,
        /// Number of groups at the time of the call.
        len: usize,
    },

    /// The operation needs an adapter but none is attached.
    #[error("No adapter attached")]
    NoAdapter,

    /// An animation duration of zero was requested.
    #[error("Animation duration must be positive")]
    InvalidDuration,
}

impl EngineError {
    /// Checks `index` against `len`.
    pub fn check_index(index: usize, len: usize) -> Result<(), EngineError> {
        if index < len {
            Ok(())
        } else {
            Err(EngineError::IndexOutOfRange { index, len })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_index_accepts_last_valid_index() {
        assert_eq!(EngineError::check_index(9, 10), Ok(()));
    }

    #[test]
    fn check_index_rejects_len() {
        assert_eq!(
            EngineError::check_index(10, 10),
            Err(EngineError::IndexOutOfRange { index: 10, len: 10 })
        );
    }

    #[test]
    fn group_error_names_the_group() {
        let err = EngineError::GroupOutOfRange { group: 3, len: 2 };
        assert_eq!(err.to_string(), "Group index 3 out of range (len: 2)");
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(EngineError::NoAdapter.to_string(), "No adapter attached");
        assert_eq!(
            EngineError::InvalidDuration.to_string(),
            "Animation duration must be positive"
        );
    }
}
