//! Error types for the Petrolog format crate.

use std::path::PathBuf;

use thiserror::Error;
use welllog_codec::CodecError;
use welllog_model::ModelError;

/// Errors that can occur when reading, writing or rewriting Petrolog logs.
#[derive(Error, Debug)]
pub enum PetrologError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed header {}: {field}: {reason}", path.display())]
    MalformedHeader {
        path: PathBuf,
        field: String,
        reason: String,
    },

    #[error("Malformed tag document at byte {position}: {reason}")]
    Dialect { position: usize, reason: String },

    #[error("Invalid data preamble in {}: {reason}", path.display())]
    InvalidPreamble { path: PathBuf, reason: String },

    #[error("Channel {name} has type {log_type}, which has no on-disk sample layout")]
    UnsupportedLogType { name: String, log_type: String },

    #[error("Sub-column {sub_index} out of range for {name} (dimension {dimension})")]
    SubColumnOutOfRange {
        name: String,
        sub_index: usize,
        dimension: usize,
    },

    #[error("Channel {0} already exists")]
    DuplicateChannel(String),

    #[error("Invalid dimension {dimension} for channel {name}")]
    InvalidDimension { name: String, dimension: usize },

    #[error("Failed to replace {} with the rewritten file: {source}", path.display())]
    PartialRewrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PetrologError>;

impl From<PetrologError> for ModelError {
    fn from(err: PetrologError) -> Self {
        match err {
            PetrologError::Model(inner) => inner,
            PetrologError::NotFound { path } => ModelError::NotFound { path },
            other => ModelError::Format {
                format: "petrolog",
                source: Box::new(other),
            },
        }
    }
}
