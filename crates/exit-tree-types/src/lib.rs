pub mod error;
pub mod exit_root;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;
pub mod global_index;
pub mod leaf;
pub mod metadata;
pub mod slots;
pub mod tree;

pub use error::{ExitTreeError, Result};
pub use exit_root::{ClaimProof, ExitRootAccumulator, GlobalExitRoot, calculate_global_exit_root};
pub use global_index::{GlobalIndex, Origin, decode_global_index, encode_global_index};
pub use leaf::{BridgeLeaf, LeafType, encode_leaf};
pub use tree::{ExitTree, TREE_DEPTH, ZERO_HASHES, verify_merkle_proof};
