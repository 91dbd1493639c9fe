use grid::error::{GridError, StorageError};
use thiserror::Error;

/// Failures that abort editor processing altogether. Problems with the
/// submitted data are answered with an [`crate::response::EditorResponse`]
/// instead.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Entity type mismatch: table edits '{table}', binding is for '{binding}'")]
    EntityMismatch { table: String, binding: String },
}
