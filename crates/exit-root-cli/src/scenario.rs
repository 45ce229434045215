//! Replays a recorded list of deposits into fresh exit trees and builds claim
//! proofs against the resulting global exit root.

use std::fs;
use std::path::Path;

use alloy_primitives::{B256, U256};
use anyhow::{Context, Result, bail};
use bridge_client::BridgeEvent;
use exit_tree_types::{ClaimProof, ExitRootAccumulator, GlobalIndex, Origin};
use serde::{Deserialize, Serialize};
use storage::ExitTreeSnapshotStore;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Tree the deposit was committed to.
    pub origin: Origin,
    pub event: BridgeEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Overrides the configured tree height.
    #[serde(default)]
    pub height: Option<usize>,
    /// Number of rollups attached to the rollup exit tree.
    #[serde(default)]
    pub rollups: u32,
    pub deposits: Vec<Deposit>,
}

/// A claim proof together with everything needed to check it offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutput {
    pub global_index: U256,
    pub leaf: B256,
    pub global_exit_root: B256,
    pub event: BridgeEvent,
    pub proof: ClaimProof,
}

impl ClaimOutput {
    /// Re-runs the proof and cross-checks the redundant fields.
    pub fn verify(&self) -> Result<bool> {
        let index = GlobalIndex::try_from(self.global_index)?;
        if index != self.proof.global_index {
            bail!("global index {} does not match proof index {}", self.global_index, self.proof.global_index);
        }
        if self.event.leaf().value() != self.leaf {
            return Ok(false);
        }
        if self.proof.global_exit_root() != self.global_exit_root {
            return Ok(false);
        }
        Ok(self.proof.verify(self.leaf)?)
    }
}

/// Network id of the bridge owning `origin`: mainnet is 0, rollup `r` runs as `r + 1`.
pub fn network_id(origin: Origin) -> u32 {
    match origin {
        Origin::Mainnet => 0,
        Origin::Rollup(index) => index + 1,
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Inserts every deposit in order, recording a snapshot of the touched tree
    /// after each one when a store is given.
    pub fn replay(
        &self,
        default_height: usize,
        store: Option<&ExitTreeSnapshotStore>,
    ) -> Result<(ExitRootAccumulator, Vec<GlobalIndex>)> {
        let mut accumulator = ExitRootAccumulator::new(self.height.unwrap_or(default_height))?;
        for _ in 0..self.rollups {
            accumulator.add_rollup()?;
        }

        let mut indexes = Vec::with_capacity(self.deposits.len());
        for deposit in &self.deposits {
            let index = accumulator.insert(deposit.origin, deposit.event.leaf().value())?;
            debug!(%index, origin = ?deposit.origin, "replayed deposit");
            if let Some(store) = store {
                store.insert_snapshot(network_id(deposit.origin), accumulator.tree(deposit.origin)?)?;
            }
            indexes.push(index);
        }

        info!(
            deposits = indexes.len(),
            rollups = self.rollups,
            global_exit_root = %accumulator.global_exit_root()?.hash(),
            "replayed scenario"
        );
        Ok((accumulator, indexes))
    }

    /// Builds the claim for the deposit at `position` in the scenario.
    pub fn claim(
        &self,
        position: usize,
        default_height: usize,
        store: Option<&ExitTreeSnapshotStore>,
    ) -> Result<ClaimOutput> {
        let deposit = self
            .deposits
            .get(position)
            .with_context(|| format!("scenario has {} deposits, no deposit {position}", self.deposits.len()))?;
        let (accumulator, indexes) = self.replay(default_height, store)?;
        let index = indexes[position];

        let proof = accumulator.claim_proof(index)?;
        let output = ClaimOutput {
            global_index: index.to_u256(),
            leaf: deposit.event.leaf().value(),
            global_exit_root: proof.global_exit_root(),
            event: deposit.event.clone(),
            proof,
        };
        if !output.verify()? {
            bail!("generated claim proof for {index} does not verify");
        }
        if let Some(store) = store {
            store.insert_claim(&output.proof)?;
        }
        Ok(output)
    }
}
