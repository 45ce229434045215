pub mod contracts;
pub mod error;
pub mod mock;
#[cfg(feature = "rpc")]
pub mod rpc;
pub mod types;

use alloy_primitives::B256;
use async_trait::async_trait;
use exit_tree_types::GlobalIndex;

pub use error::{BridgeError, Result};
pub use types::{BridgeEvent, ClaimRequest};

/// Bridge contract deployed on one network.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn network_id(&self) -> Result<u32>;
    /// Number of deposits in this bridge's local exit tree.
    async fn deposit_count(&self) -> Result<u64>;
    async fn local_exit_root(&self) -> Result<B256>;
    async fn is_claimed(&self, global_index: GlobalIndex) -> Result<bool>;
    async fn claim(&self, request: &ClaimRequest) -> Result<()>;
}

/// Keeper of the global exit roots a bridge accepts claims against.
#[async_trait]
pub trait GlobalExitRootManager: Send + Sync {
    async fn last_global_exit_root(&self) -> Result<B256>;
    async fn last_mainnet_exit_root(&self) -> Result<B256>;
    async fn last_rollup_exit_root(&self) -> Result<B256>;
    /// Timestamp the root was recorded at, `None` if it was never published.
    async fn global_exit_root_timestamp(&self, global_exit_root: B256) -> Result<Option<u64>>;
}

#[async_trait]
pub trait RollupManager: Send + Sync {
    async fn rollup_count(&self) -> Result<u32>;
    async fn rollup_exit_root(&self) -> Result<B256>;
}
