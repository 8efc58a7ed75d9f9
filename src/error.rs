//! Error types for fallible matrix construction.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("rank {0} is neither zero nor a power of two")]
    InvalidRank(u32),
    #[error("could not allocate storage for a matrix of rank {rank}")]
    Allocation { rank: u32 },
    #[error("rank {rank} needs {expected} elements, got {actual}")]
    LengthMismatch {
        rank: u32,
        expected: u64,
        actual: usize,
    },
}

// Result Type
pub type Result<T> = std::result::Result<T, MatrixError>;
