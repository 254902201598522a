use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network Error: {0}")]
    Client(#[from] catapi_client::Error),
    /// A request that attached to another requester's in-flight fetch and
    /// received its failure. Only the error text survives the shared slot.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Cannot encode/decode JSON: {0}")]
    JSONError(#[from] serde_json::Error),
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
