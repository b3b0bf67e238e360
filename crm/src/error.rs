use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the record store and access layer can surface.
///
/// Each variant carries enough context to render a distinct, non-generic
/// message; an empty search result is never an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An empty/malformed field or an unrecognized enumeration value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Username and password did not match a stored user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with a username that is already taken.
    #[error("username '{0}' already exists")]
    DuplicateUser(String),

    /// A task was assigned to a name that is not a registered employee.
    #[error("'{0}' is not a registered employee")]
    UnknownEmployee(String),

    /// No task carries the requested id.
    #[error("no task with id {0}")]
    UnknownTask(u64),

    /// A positional table operation was given an index past the end.
    #[error("index {index} is out of range for a table of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    /// The caller's role (or task ownership) does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The persisted file exists but does not match the canonical schema,
    /// either in its header row or in the shape of a data row. Fatal for the
    /// affected table; never auto-repaired.
    #[error("table {path} is corrupt: {detail}")]
    StoreCorrupt { path: PathBuf, detail: String },

    /// Reading or durably writing the backing file failed. The operation is
    /// considered not committed.
    #[error("failed to persist {path}: {message}")]
    Persistence { path: PathBuf, message: String },
}
