//! Failure taxonomy for remote operations.

/// Classified failure of a single remote operation.
///
/// Errors are `Clone` because one terminal state may be observed by several
/// continuations and by `join` callers.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StoreError {
    /// Network or service failure. The caller may retry by issuing a fresh
    /// operation; nothing retries automatically.
    #[error("remote transfer failed: {0}")]
    Transport(String),

    /// The remote service answered 403 or 404. The local credential store has
    /// been cleared; the next use requires signing in again.
    #[error("no permission to access {resource} (sign in again with `waymark login`)")]
    Permission { resource: String },

    /// The canonical version ledger document specifically is inaccessible.
    #[error("version ledger inaccessible: {0}")]
    LedgerAccess(String),

    /// Serialization or local file failure, fatal to the one operation it
    /// occurred in.
    #[error("local io failed: {0}")]
    LocalIo(String),
}

impl StoreError {
    pub(crate) fn transport(label: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Transport(format!("{}: {}", label, err))
    }

    pub(crate) fn local(label: &str, err: impl std::fmt::Display) -> Self {
        StoreError::LocalIo(format!("{}: {}", label, err))
    }
}
