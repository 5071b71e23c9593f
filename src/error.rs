use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single passage's extraction call.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),
}

/// Failure of a single alias-classification batch.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed classification response: {0}")]
    MalformedResponse(String),
}

/// Fatal I/O failure while reading input or writing an artifact.
#[derive(Debug, Error)]
pub enum GraphIoError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<anyhow::Error> for ExtractionError {
    fn from(err: anyhow::Error) -> Self {
        ExtractionError::Provider(err.to_string())
    }
}

impl From<anyhow::Error> for ClassificationError {
    fn from(err: anyhow::Error) -> Self {
        ClassificationError::Provider(err.to_string())
    }
}
