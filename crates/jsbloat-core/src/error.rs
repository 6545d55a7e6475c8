use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid HAR structure: {0}")]
    InvalidStructure(String),

    #[error("Malformed coverage for script {script_id}: {reason}")]
    MalformedCoverage { script_id: String, reason: String },

    #[error("Unused JavaScript summary failed for script {script_id}: {reason}")]
    Summary { script_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
