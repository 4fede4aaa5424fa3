//! Error types shared across the library.

use thiserror::Error;

/// Rejected session operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown exercise `{0}`")]
    UnknownExercise(String),
    #[error("unknown micro session `{0}`")]
    UnknownSession(String),
    #[error("session not ready to complete: {cycles} of {required} cycles done")]
    NotReady { cycles: u32, required: u32 },
    #[error("no active session")]
    NoActiveSession,
    #[error("exercise `{0}` has no phase with a non-zero duration")]
    EmptyPattern(String),
}

/// Errors emitted by the session history store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
