use thiserror::Error;

use super::LifecycleState;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum CacheStorageError {
    #[error("Cache storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Cache bucket not found: {0}")]
    BucketNotFound(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Install failed fetching {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("Cache storage error: {0}")]
    Storage(#[from] CacheStorageError),

    #[error("Worker task is no longer running")]
    WorkerGone,
}
