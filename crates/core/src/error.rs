use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("malformed vector file {path:?}: {reason}")]
    VectorFormat { path: PathBuf, reason: String },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("encoder error: {0}")]
    Encoder(String),
    #[error("other: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CtxError>;

impl From<anyhow::Error> for CtxError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}
