use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid entity catalog: {0}")]
    Catalog(String),

    #[error("Failed to read entity catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse entity catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
