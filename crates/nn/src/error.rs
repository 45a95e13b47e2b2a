use std::path::PathBuf;

use ndarray_npy::{ReadNpyError, WriteNpyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WriteNpyError,
    },

    #[error("Shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Training batch is empty")]
    EmptyBatch,
}

pub type Result<T> = std::result::Result<T, NnError>;
