use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::asset::AssetClientError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read input {path}: {source}")]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("asset creation failed for {url}: {source}")]
    Create {
        url: String,
        source: AssetClientError,
    },
    #[error("status query failed for asset {asset_id}: {source}")]
    Status {
        asset_id: String,
        source: AssetClientError,
    },
    #[error("asset {asset_id} did not settle within {elapsed:?}")]
    PollDeadline { asset_id: String, elapsed: Duration },
    #[error("import cancelled")]
    Cancelled,
    #[error("checkpoint write to {path} failed: {source}")]
    Checkpoint {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("checkpoint holds {recorded} results but the input only has {available} items")]
    ResumeMismatch { recorded: usize, available: usize },
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
}

pub type ImportResult<T> = Result<T, ImportError>;
