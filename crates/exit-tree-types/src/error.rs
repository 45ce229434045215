use alloy_primitives::U256;
use thiserror::Error;

/// Result type for exit tree and encoder operations
pub type Result<T> = std::result::Result<T, ExitTreeError>;

/// Errors raised by the exit trees and the leaf and global index encoders
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExitTreeError {
    #[error("exit tree is full: capacity is {capacity} leaves")]
    CapacityExceeded { capacity: u64 },

    #[error("index {index} out of range: must be below {limit}")]
    IndexOutOfRange { index: U256, limit: U256 },

    #[error("malformed proof: expected {expected} siblings, got {got}")]
    MalformedProof { expected: usize, got: usize },

    #[error("invalid tree height {0}: must be between 1 and 32")]
    InvalidHeight(usize),

    #[error("invalid leaf type {0}: expected 0 (asset) or 1 (message)")]
    InvalidLeafType(u8),

    #[error("corrupt exit tree: {0}")]
    CorruptTree(&'static str),
}

impl ExitTreeError {
    pub(crate) fn out_of_range(index: U256, limit: U256) -> Self {
        Self::IndexOutOfRange { index, limit }
    }
}
