//! Error types for the well-log entity model.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("No registered format recognises {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Channel index {index} out of range ({count} channels)")]
    ChannelIndexOutOfRange { index: usize, count: usize },

    #[error("The index channel {0} cannot be deleted or overwritten")]
    IndexChannelProtected(String),

    #[error("Log has no index channel")]
    NoIndexChannel,

    #[error("Channel {name} has {actual} samples, index channel has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("{format} error: {source}")]
    Format {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
