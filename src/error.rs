//! Error types for the simulation core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("tile grid row {row} has {actual} columns, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
