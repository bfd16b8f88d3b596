//! Application-wide error types.
//!
//! Each subsystem has its own `thiserror` enum; [`Error`] aggregates them so
//! the sync command can use `?` across subsystems. `main` and the CLI wrap
//! everything in `anyhow` at the very top.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Subsystem errors ([`BackendError`], [`AcquireError`], [`RecommendError`],
//!   [`SyncError`], [`ConfigError`]) for detailed handling
//! - Leaf code never exits the process; only `main` turns an error into an exit code

use crate::acquire::AcquireError;
use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::recommend::RecommendError;
use crate::reconcile::SyncError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Acquisition error: {0}")]
    Acquire(#[from] AcquireError),

    #[error("Recommendation error: {0}")]
    Recommend(#[from] RecommendError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::from(ConfigError::Missing("backend.url")).context("while loading config");
        let msg = err.to_string();
        assert!(msg.starts_with("while loading config"));
        assert!(msg.contains("backend.url"));
    }

    #[test]
    fn test_subsystem_conversions() {
        let err: Error = BackendError::LibraryNotFound("Explo".to_string()).into();
        assert!(matches!(err, Error::Backend(_)));

        let err: Error = AcquireError::NoCandidate.into();
        assert!(err.to_string().contains("No acceptable candidate"));
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), RecommendError> =
            Err(RecommendError::NotFound("weekly exploration".to_string()));
        let with_ctx = result.with_context("fetching recommendations");
        assert!(
            with_ctx
                .unwrap_err()
                .to_string()
                .contains("fetching recommendations")
        );
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.with_context("reading tracks").unwrap_err();
        assert!(matches!(err, Error::WithContext { .. }));
    }
}
