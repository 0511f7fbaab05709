use thiserror::Error;

/// Errors that can occur in the storage layer, local or remote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: u64, quota: u64 },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote error: {0}")]
    Remote(String),
}
