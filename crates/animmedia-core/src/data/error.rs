use thiserror::Error;

use crate::worker::FetchError;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("HTTP error {status} loading {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
