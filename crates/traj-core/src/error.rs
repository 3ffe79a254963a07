use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("could not guess file format: {0}")]
    FormatUnresolved(String),
    /// Operation not legal in the current mode, or a malformed argument combination.
    #[error("invalid state: {0}")]
    State(String),
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("corrupted frame: {0}")]
    CorruptFrame(String),
}

pub type TrajResult<T> = Result<T, TrajError>;
