use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolCall;
use exit_tree_types::{
    BridgeLeaf, ClaimProof, ExitTreeError, GlobalIndex, LeafType, TREE_DEPTH, metadata::metadata_hash,
};
use serde::{Deserialize, Serialize};

use crate::contracts::IPolygonZkEVMBridgeV2::{claimAssetCall, claimMessageCall};
use crate::error::Result;

/// A bridge transfer with its raw metadata, as emitted by a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEvent {
    pub leaf_type: LeafType,
    pub origin_network: u32,
    pub origin_address: Address,
    pub destination_network: u32,
    pub destination_address: Address,
    pub amount: U256,
    pub metadata: Bytes,
}

impl BridgeEvent {
    pub fn leaf(&self) -> BridgeLeaf {
        BridgeLeaf {
            leaf_type: self.leaf_type,
            origin_network: self.origin_network,
            origin_address: self.origin_address,
            destination_network: self.destination_network,
            destination_address: self.destination_address,
            amount: self.amount,
            metadata_hash: metadata_hash(&self.metadata),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub proof: ClaimProof,
    pub event: BridgeEvent,
}

impl ClaimRequest {
    pub fn new(proof: ClaimProof, event: BridgeEvent) -> Self {
        Self { proof, event }
    }

    /// ABI-encoded `claimAsset` or `claimMessage` call for this request.
    ///
    /// The on-chain bridge only accepts full-height sibling paths.
    pub fn calldata(&self) -> Result<Bytes> {
        let local = full_height_path(&self.proof.smt_proof_local_exit_root)?;
        let rollup = full_height_path(&self.proof.smt_proof_rollup_exit_root)?;
        let event = &self.event;
        let encoded = match event.leaf_type {
            LeafType::Asset => claimAssetCall {
                smtProofLocalExitRoot: local,
                smtProofRollupExitRoot: rollup,
                globalIndex: self.proof.global_index.to_u256(),
                mainnetExitRoot: self.proof.mainnet_exit_root,
                rollupExitRoot: self.proof.rollup_exit_root,
                originNetwork: event.origin_network,
                originTokenAddress: event.origin_address,
                destinationNetwork: event.destination_network,
                destinationAddress: event.destination_address,
                amount: event.amount,
                metadata: event.metadata.clone(),
            }
            .abi_encode(),
            LeafType::Message => claimMessageCall {
                smtProofLocalExitRoot: local,
                smtProofRollupExitRoot: rollup,
                globalIndex: self.proof.global_index.to_u256(),
                mainnetExitRoot: self.proof.mainnet_exit_root,
                rollupExitRoot: self.proof.rollup_exit_root,
                originNetwork: event.origin_network,
                originAddress: event.origin_address,
                destinationNetwork: event.destination_network,
                destinationAddress: event.destination_address,
                amount: event.amount,
                metadata: event.metadata.clone(),
            }
            .abi_encode(),
        };
        Ok(encoded.into())
    }
}

fn full_height_path(path: &[B256]) -> Result<[B256; TREE_DEPTH]> {
    path.try_into().map_err(|_| {
        ExitTreeError::MalformedProof {
            expected: TREE_DEPTH,
            got: path.len(),
        }
        .into()
    })
}

/// Network whose bridge emitted the leaf: 0 for mainnet, `rollup_index + 1` otherwise.
///
/// Together with the local index this is the key the bridge uses to track
/// processed claims.
pub fn source_bridge_network(index: &GlobalIndex) -> Result<u32> {
    if index.mainnet {
        return Ok(0);
    }
    let network = u64::from(index.rollup_index) + 1;
    u32::try_from(network).map_err(|_| {
        ExitTreeError::IndexOutOfRange {
            index: U256::from(network),
            limit: U256::from(u32::MAX),
        }
        .into()
    })
}
