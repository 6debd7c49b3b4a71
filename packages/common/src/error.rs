use thiserror::Error;

/// Failure talking to the key-value store backing saved projects
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<String> for StorageError {
    fn from(s: String) -> Self {
        StorageError::Unavailable(s)
    }
}

impl From<&str> for StorageError {
    fn from(s: &str) -> Self {
        StorageError::Unavailable(s.to_string())
    }
}
