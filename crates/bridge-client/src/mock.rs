//! In-memory contract stand-ins sharing one set of exit trees.
//!
//! Mainnet deposits are published to the global exit root manager right away.
//! Rollup deposits stay pending on their rollup until `verify_batches` moves
//! them into the rollup's local exit tree and publishes the new roots, so a
//! rollup-origin claim only succeeds after verification.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;
use exit_tree_types::{
    ClaimProof, ExitRootAccumulator, ExitTree, ExitTreeError, GlobalExitRoot, GlobalIndex, Origin,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::types::{BridgeEvent, ClaimRequest, source_bridge_network};
use crate::{Bridge, GlobalExitRootManager, RollupManager};

struct NetworkState {
    accumulator: ExitRootAccumulator,
    /// Rollup deposits not yet settled on mainnet, by rollup index.
    pending: HashMap<u32, Vec<B256>>,
    global_exit_roots: HashMap<B256, u64>,
    /// Processed claims per bridge network, keyed by `(local index, source bridge network)`.
    claimed: HashMap<u32, HashSet<(u32, u32)>>,
    last_global_exit_root: GlobalExitRoot,
    clock: u64,
}

impl NetworkState {
    fn publish(&mut self) -> Result<B256> {
        let global_exit_root = self.accumulator.global_exit_root()?;
        let hash = global_exit_root.hash();
        self.clock += 1;
        self.global_exit_roots.entry(hash).or_insert(self.clock);
        self.last_global_exit_root = global_exit_root;
        debug!(global_exit_root = %hash, timestamp = self.clock, "published global exit root");
        Ok(hash)
    }

    /// The rollup's local exit tree as the rollup itself sees it, pending leaves included.
    fn rollup_view(&self, rollup_index: u32) -> Result<ExitTree> {
        let mut tree = self.accumulator.rollup_tree(rollup_index)?.clone();
        for leaf in self.pending.get(&rollup_index).into_iter().flatten() {
            tree.insert(*leaf)?;
        }
        Ok(tree)
    }
}

/// Mainnet plus its rollups, with handles for every contract role.
#[derive(Clone)]
pub struct MockNetwork {
    state: Arc<RwLock<NetworkState>>,
}

impl MockNetwork {
    pub fn new(height: usize) -> Result<Self> {
        let accumulator = ExitRootAccumulator::new(height)?;
        let last_global_exit_root = accumulator.global_exit_root()?;
        Ok(Self {
            state: Arc::new(RwLock::new(NetworkState {
                accumulator,
                pending: HashMap::new(),
                global_exit_roots: HashMap::new(),
                claimed: HashMap::new(),
                last_global_exit_root,
                clock: 0,
            })),
        })
    }

    pub fn mainnet_bridge(&self) -> MockBridge {
        MockBridge::new(0, Origin::Mainnet, self.clone())
    }

    /// Bridge of the rollup at `rollup_index`, which runs as network `rollup_index + 1`.
    pub fn rollup_bridge(&self, rollup_index: u32) -> MockBridge {
        MockBridge::new(rollup_index + 1, Origin::Rollup(rollup_index), self.clone())
    }

    pub fn global_exit_root_manager(&self) -> MockGlobalExitRootManager {
        MockGlobalExitRootManager { network: self.clone() }
    }

    pub fn rollup_manager(&self) -> MockRollupManager {
        MockRollupManager { network: self.clone() }
    }

    /// Proof for a settled leaf against the latest published roots.
    pub async fn claim_proof(&self, global_index: GlobalIndex) -> Result<ClaimProof> {
        Ok(self.state.read().await.accumulator.claim_proof(global_index)?)
    }
}

/// Handle to one network's bridge. Handles for the same network share claim records.
pub struct MockBridge {
    network_id: u32,
    origin: Origin,
    network: MockNetwork,
}

impl MockBridge {
    fn new(network_id: u32, origin: Origin, network: MockNetwork) -> Self {
        Self {
            network_id,
            origin,
            network,
        }
    }

    /// Record a deposit in this bridge's local exit tree.
    pub async fn bridge(&self, event: &BridgeEvent) -> Result<GlobalIndex> {
        let leaf = event.leaf().value();
        let mut state = self.network.state.write().await;
        let index = match self.origin {
            Origin::Mainnet => {
                let index = state.accumulator.insert(Origin::Mainnet, leaf)?;
                state.publish()?;
                index
            }
            Origin::Rollup(rollup_index) => {
                let view = state.rollup_view(rollup_index)?;
                if view.is_full() {
                    return Err(ExitTreeError::CapacityExceeded {
                        capacity: view.capacity(),
                    }
                    .into());
                }
                state.pending.entry(rollup_index).or_default().push(leaf);
                GlobalIndex::rollup(rollup_index, view.count() as u32)
            }
        };
        info!(network_id = self.network_id, global_index = %index, amount = %event.amount, "bridged");
        Ok(index)
    }
}

#[async_trait]
impl Bridge for MockBridge {
    async fn network_id(&self) -> Result<u32> {
        Ok(self.network_id)
    }

    async fn deposit_count(&self) -> Result<u64> {
        let state = self.network.state.read().await;
        Ok(match self.origin {
            Origin::Mainnet => state.accumulator.mainnet_tree().count(),
            Origin::Rollup(rollup_index) => state.rollup_view(rollup_index)?.count(),
        })
    }

    async fn local_exit_root(&self) -> Result<B256> {
        let state = self.network.state.read().await;
        Ok(match self.origin {
            Origin::Mainnet => state.accumulator.mainnet_exit_root(),
            Origin::Rollup(rollup_index) => state.rollup_view(rollup_index)?.root(),
        })
    }

    async fn is_claimed(&self, global_index: GlobalIndex) -> Result<bool> {
        let key = (global_index.local_index, source_bridge_network(&global_index)?);
        let state = self.network.state.read().await;
        Ok(state
            .claimed
            .get(&self.network_id)
            .is_some_and(|claimed| claimed.contains(&key)))
    }

    async fn claim(&self, request: &ClaimRequest) -> Result<()> {
        let event = &request.event;
        if event.destination_network != self.network_id {
            return Err(BridgeError::DestinationNetworkInvalid {
                expected: self.network_id,
                got: event.destination_network,
            });
        }

        let proof = &request.proof;
        let global_exit_root = proof.global_exit_root();
        let mut state = self.network.state.write().await;
        if !state.global_exit_roots.contains_key(&global_exit_root) {
            return Err(BridgeError::GlobalExitRootInvalid(global_exit_root));
        }
        let height = state.accumulator.height();
        if proof.height() != height {
            return Err(ExitTreeError::MalformedProof {
                expected: height,
                got: proof.height(),
            }
            .into());
        }

        if !proof.verify(event.leaf().value())? {
            return Err(BridgeError::InvalidSmtProof);
        }

        let global_index = proof.global_index;
        let key = (global_index.local_index, source_bridge_network(&global_index)?);
        if !state.claimed.entry(self.network_id).or_default().insert(key) {
            return Err(BridgeError::AlreadyClaimed(global_index));
        }
        drop(state);

        info!(
            network_id = self.network_id,
            global_index = %global_index,
            destination = %event.destination_address,
            amount = %event.amount,
            "claimed"
        );
        Ok(())
    }
}

pub struct MockGlobalExitRootManager {
    network: MockNetwork,
}

#[async_trait]
impl GlobalExitRootManager for MockGlobalExitRootManager {
    async fn last_global_exit_root(&self) -> Result<B256> {
        Ok(self.network.state.read().await.last_global_exit_root.hash())
    }

    async fn last_mainnet_exit_root(&self) -> Result<B256> {
        Ok(self.network.state.read().await.last_global_exit_root.mainnet_exit_root)
    }

    async fn last_rollup_exit_root(&self) -> Result<B256> {
        Ok(self.network.state.read().await.last_global_exit_root.rollup_exit_root)
    }

    async fn global_exit_root_timestamp(&self, global_exit_root: B256) -> Result<Option<u64>> {
        Ok(self
            .network
            .state
            .read()
            .await
            .global_exit_roots
            .get(&global_exit_root)
            .copied())
    }
}

pub struct MockRollupManager {
    network: MockNetwork,
}

impl MockRollupManager {
    /// Register a new rollup and return its index in the rollup exit tree.
    pub async fn add_rollup(&self) -> Result<u32> {
        Ok(self.network.state.write().await.accumulator.add_rollup()?)
    }

    /// Settle the rollup's pending deposits and publish the resulting roots.
    pub async fn verify_batches(&self, rollup_index: u32) -> Result<B256> {
        let mut state = self.network.state.write().await;
        // fail before draining if the rollup is unknown
        state.accumulator.rollup_tree(rollup_index)?;
        let pending = state.pending.remove(&rollup_index).unwrap_or_default();
        for leaf in &pending {
            state.accumulator.insert(Origin::Rollup(rollup_index), *leaf)?;
        }
        let local_exit_root = state.accumulator.local_exit_root(Origin::Rollup(rollup_index))?;
        info!(rollup_index, settled = pending.len(), local_exit_root = %local_exit_root, "verified batches");
        state.publish()
    }
}

#[async_trait]
impl RollupManager for MockRollupManager {
    async fn rollup_count(&self) -> Result<u32> {
        Ok(self.network.state.read().await.accumulator.rollup_count())
    }

    async fn rollup_exit_root(&self) -> Result<B256> {
        Ok(self.network.state.read().await.accumulator.rollup_exit_root()?)
    }
}
