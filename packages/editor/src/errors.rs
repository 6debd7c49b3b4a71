//! Error types for the editor

use bigo_common::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No active project")]
    NoActiveProject,

    #[error("Unknown pane: {0}")]
    UnknownPane(String),
}
