use thiserror::Error;

/// Error type shared across the meter ingest pipeline
#[derive(Error, Debug)]
pub enum HanError {
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("timeout")]
    Timeout,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("frame invalid: {0}")]
    FrameInvalid(String),
}

/// Result type alias for meter ingest pipeline operations
pub type HanResult<T> = Result<T, HanError>;
