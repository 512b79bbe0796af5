use shelver_core::LayoutError;
use std::path::PathBuf;
use thiserror::Error;

/// Sorter error types
#[derive(Error, Debug)]
pub enum SortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file: {}", .0.display())]
    Unsupported(PathBuf),
}

impl From<lofty::error::LoftyError> for SortError {
    fn from(err: lofty::error::LoftyError) -> Self {
        SortError::Tag(err.to_string())
    }
}

impl From<notify_debouncer_full::notify::Error> for SortError {
    fn from(err: notify_debouncer_full::notify::Error) -> Self {
        SortError::Watch(err.to_string())
    }
}

pub type SortResult<T> = Result<T, SortError>;
