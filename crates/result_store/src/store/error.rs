//! Storage error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Which boundary of the storage engine rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StoreErrorKind {
    /// The engine could not be opened or initialized.
    #[display("storage unavailable")]
    StorageUnavailable,
    /// An insert or update was rejected.
    #[display("write failure")]
    WriteFailure,
    /// A read was rejected.
    #[display("query failure")]
    QueryFailure,
}

/// Storage error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error ({}): {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Error category.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a [`StoreErrorKind::StorageUnavailable`] error.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::StorageUnavailable, message)
    }

    /// Shorthand for a [`StoreErrorKind::WriteFailure`] error.
    #[track_caller]
    pub fn write(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::WriteFailure, message)
    }

    /// Shorthand for a [`StoreErrorKind::QueryFailure`] error.
    #[track_caller]
    pub fn query(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::QueryFailure, message)
    }

    /// Returns the error category.
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::unavailable(format!("Connection error: {}", err))
    }
}
