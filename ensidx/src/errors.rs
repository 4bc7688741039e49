use std::io;

use thiserror::Error;

use crate::key::StorageKey;

/// Failure taxonomy for schema resolution, indexing and sample assembly.
///
/// `Schema` and `GridBounds` abort index construction for the whole dataset.
/// `MissingData` is scoped to a single sample and is never masked by
/// substituting synthetic data.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("grid bounds error: {0}")]
    GridBounds(String),

    #[error("missing data for key: {0}")]
    MissingData(StorageKey),

    #[error("index {index} is out of bounds for dataset of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("malformed descriptor: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
