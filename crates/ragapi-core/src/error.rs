use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding or generation provider returned a failure.
    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Vector index request failed: {0}")]
    Index(String),

    #[error(
        "Collection '{collection}' was created with dimension {existing}, \
         but the embedding provider now returns {probe}"
    )]
    DimensionMismatch {
        collection: String,
        existing: usize,
        probe: usize,
    },
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
