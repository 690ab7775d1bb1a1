use thiserror::Error;

/// Errors raised by bracket persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("bracket schema version {found} does not match expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("no bracket found at {path}")]
    NotFound { path: String },

    #[error("corrupted bracket data: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Whether the caller can recover by regenerating the bracket from
    /// standings instead of failing outright.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(_) => false,
            StoreError::Serialization(_)
            | StoreError::VersionMismatch { .. }
            | StoreError::NotFound { .. }
            | StoreError::Corrupted(_) => true,
        }
    }
}
