//! Tracing subscriber initialization.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the host. The demo binary calls [`init`] to send them to a file so they can
//! be followed with `tail -f` while the terminal UI owns the screen.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Log path has no parent directory
    #[error("Log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Directory and file name of a log path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    /// Directory holding the log file.
    pub directory: PathBuf,
    /// File name inside `directory`.
    pub file_name: String,
}

/// Splits `log_path` into directory and file name.
///
/// A bare file name resolves to the current directory.
///
/// # Errors
///
/// [`LoggingError::InvalidPath`] when the path has no UTF-8 file name,
/// [`LoggingError::NoParentDirectory`] when it has no parent (a root path).
pub fn resolve_target(log_path: &Path) -> Result<LogTarget, LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;
    let directory = if directory.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        directory.to_path_buf()
    };

    Ok(LogTarget {
        directory,
        file_name: file_name.to_string(),
    })
}

/// Initialize the tracing subscriber with file-based logging.
///
/// Respects `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]. Creates the log
/// directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the path is unusable, the directory cannot be created
/// or a global subscriber is already installed.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    init_with_default(log_path, DEFAULT_FILTER)
}

/// Like [`init`] with a caller-chosen fallback filter, e.g. `"scrollcell=trace"`.
///
/// # Errors
///
/// Same as [`init`].
pub fn init_with_default(log_path: &Path, default_filter: &str) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let target = resolve_target(log_path)?;

    std::fs::create_dir_all(&target.directory).map_err(|source| {
        LoggingError::DirectoryCreation {
            path: target.directory.clone(),
            source,
        }
    })?;

    let file_appender = tracing_appender::rolling::never(&target.directory, &target.file_name);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false) // No ANSI colors in log files
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn resolve_target_splits_path() {
        let target = resolve_target(Path::new("/var/log/scrollcell/engine.log")).unwrap();
        assert_eq!(target.directory, PathBuf::from("/var/log/scrollcell"));
        assert_eq!(target.file_name, "engine.log");
    }

    #[test]
    fn resolve_target_bare_name_uses_current_dir() {
        let target = resolve_target(Path::new("engine.log")).unwrap();
        assert_eq!(target.directory, PathBuf::from("."));
    }

    #[test]
    fn resolve_target_rejects_root() {
        let err = resolve_target(Path::new("/")).unwrap_err();
        assert!(
            matches!(err, LoggingError::InvalidPath(_)),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    #[serial(tracing_init)]
    fn init_creates_log_directory_if_missing() {
        let test_dir = std::env::temp_dir().join("scrollcell_test_logs_create");
        let log_file = test_dir.join("test.log");

        let _ = fs::remove_dir_all(&test_dir);

        // May fail if a subscriber is already set; the directory is created first.
        let _ = init(&log_file);

        assert!(
            test_dir.exists(),
            "Log directory should be created: {:?}",
            test_dir
        );

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    #[serial(tracing_init)]
    fn second_init_reports_subscriber_already_set() {
        let test_dir = std::env::temp_dir().join("scrollcell_test_logs_twice");
        let log_file = test_dir.join("twice.log");

        let _ = init(&log_file);
        let second = init_with_default(&log_file, "scrollcell=trace");

        assert!(
            matches!(second, Err(LoggingError::SubscriberAlreadySet)),
            "second init should fail, got {second:?}"
        );

        let _ = fs::remove_dir_all(&test_dir);
    }
}
