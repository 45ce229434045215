use alloy_primitives::B256;
use exit_tree_types::{ExitTreeError, GlobalIndex};
use thiserror::Error;

/// Result type for contract client operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failures reported by bridge, exit root manager and rollup manager clients
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("claim already processed for global index {0}")]
    AlreadyClaimed(GlobalIndex),

    #[error("global exit root {0} is not known to the exit root manager")]
    GlobalExitRootInvalid(B256),

    #[error("merkle proof does not match the claimed exit roots")]
    InvalidSmtProof,

    #[error("destination network {got} does not match bridge network {expected}")]
    DestinationNetworkInvalid { expected: u32, got: u32 },

    #[error("exit tree error: {0}")]
    Tree(#[from] ExitTreeError),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction {0} reverted")]
    Reverted(B256),
}
