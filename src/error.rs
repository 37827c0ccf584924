use thiserror::Error;

/// Errors surfaced by the facade and its engine. No retries, no local
/// recovery; a failed operation never disturbs an installed handle.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("index build failed: {0}")]
    Build(String),

    #[error("no index handle: call build() or load() first")]
    NotBuilt,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid index file: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
