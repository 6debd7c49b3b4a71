use crate::error::StorageError;

/// Common Result type alias
pub type StorageResult<T> = Result<T, StorageError>;
