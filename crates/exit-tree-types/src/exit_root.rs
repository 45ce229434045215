//! Two-level exit root accounting.
//!
//! Mainnet deposits go to the mainnet exit tree. Every rollup has its own local
//! exit tree, and the roots of those trees are the leaves of the rollup exit
//! tree, with rollup `i` at slot `i`. The global exit root commits to both
//! levels at once.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExitTreeError, Result};
use crate::global_index::{GlobalIndex, Origin};
use crate::tree::{ExitTree, TREE_DEPTH, branch_root, keccak256_concat, verify_merkle_proof};

/// `keccak256(mainnetExitRoot ‖ rollupExitRoot)`
pub fn calculate_global_exit_root(mainnet_exit_root: &B256, rollup_exit_root: &B256) -> B256 {
    keccak256_concat(mainnet_exit_root, rollup_exit_root)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalExitRoot {
    pub mainnet_exit_root: B256,
    pub rollup_exit_root: B256,
}

impl GlobalExitRoot {
    pub fn new(mainnet_exit_root: B256, rollup_exit_root: B256) -> Self {
        Self {
            mainnet_exit_root,
            rollup_exit_root,
        }
    }

    pub fn hash(&self) -> B256 {
        calculate_global_exit_root(&self.mainnet_exit_root, &self.rollup_exit_root)
    }
}

/// Everything a bridge needs to accept a claim besides the leaf itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProof {
    pub global_index: GlobalIndex,
    pub smt_proof_local_exit_root: Vec<B256>,
    pub smt_proof_rollup_exit_root: Vec<B256>,
    pub mainnet_exit_root: B256,
    pub rollup_exit_root: B256,
}

impl ClaimProof {
    pub fn height(&self) -> usize {
        self.smt_proof_local_exit_root.len()
    }

    pub fn global_exit_root(&self) -> B256 {
        calculate_global_exit_root(&self.mainnet_exit_root, &self.rollup_exit_root)
    }

    /// Verify `leaf` the way the bridge contract does.
    ///
    /// Mainnet leaves are checked against the mainnet exit root. Rollup leaves
    /// are folded into their local exit root, which is then checked at the
    /// rollup's slot of the rollup exit tree. Both sibling paths must have the
    /// same length.
    pub fn verify(&self, leaf: B256) -> Result<bool> {
        let height = self.height();
        if height == 0 || height > TREE_DEPTH {
            return Err(ExitTreeError::InvalidHeight(height));
        }
        if self.smt_proof_rollup_exit_root.len() != height {
            return Err(ExitTreeError::MalformedProof {
                expected: height,
                got: self.smt_proof_rollup_exit_root.len(),
            });
        }
        let local_index = u64::from(self.global_index.local_index);
        if self.global_index.mainnet {
            return verify_merkle_proof(
                leaf,
                local_index,
                &self.smt_proof_local_exit_root,
                self.mainnet_exit_root,
                height,
            );
        }
        if local_index >= 1u64 << height {
            return Ok(false);
        }
        let local_exit_root = branch_root(leaf, &self.smt_proof_local_exit_root, local_index);
        verify_merkle_proof(
            local_exit_root,
            u64::from(self.global_index.rollup_index),
            &self.smt_proof_rollup_exit_root,
            self.rollup_exit_root,
            height,
        )
    }
}

/// Mainnet exit tree plus one local exit tree per rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAccumulator")]
pub struct ExitRootAccumulator {
    height: usize,
    mainnet: ExitTree,
    rollups: Vec<ExitTree>,
}

#[derive(Deserialize)]
struct RawAccumulator {
    height: usize,
    mainnet: ExitTree,
    rollups: Vec<ExitTree>,
}

impl TryFrom<RawAccumulator> for ExitRootAccumulator {
    type Error = ExitTreeError;

    fn try_from(raw: RawAccumulator) -> Result<Self> {
        let accumulator = Self::new(raw.height)?;
        if raw.rollups.len() as u64 > 1u64 << raw.height {
            return Err(ExitTreeError::CorruptTree("more rollups than the rollup exit tree can hold"));
        }
        if std::iter::once(&raw.mainnet)
            .chain(&raw.rollups)
            .any(|tree| tree.height() != raw.height)
        {
            return Err(ExitTreeError::CorruptTree("member tree height differs from accumulator height"));
        }
        Ok(Self {
            mainnet: raw.mainnet,
            rollups: raw.rollups,
            ..accumulator
        })
    }
}

impl ExitRootAccumulator {
    pub fn new(height: usize) -> Result<Self> {
        Ok(Self {
            height,
            mainnet: ExitTree::new(height)?,
            rollups: Vec::new(),
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Register a new rollup and return its slot in the rollup exit tree.
    pub fn add_rollup(&mut self) -> Result<u32> {
        let capacity = 1u64 << self.height;
        if self.rollups.len() as u64 >= capacity {
            return Err(ExitTreeError::CapacityExceeded { capacity });
        }
        self.rollups.push(ExitTree::new(self.height)?);
        let rollup_index = (self.rollups.len() - 1) as u32;
        info!(rollup_index, "registered rollup exit tree");
        Ok(rollup_index)
    }

    pub fn rollup_count(&self) -> u32 {
        self.rollups.len() as u32
    }

    pub fn mainnet_tree(&self) -> &ExitTree {
        &self.mainnet
    }

    pub fn rollup_tree(&self, rollup_index: u32) -> Result<&ExitTree> {
        self.rollups
            .get(rollup_index as usize)
            .ok_or_else(|| ExitTreeError::out_of_range(U256::from(rollup_index), U256::from(self.rollup_count())))
    }

    pub fn tree(&self, origin: Origin) -> Result<&ExitTree> {
        match origin {
            Origin::Mainnet => Ok(&self.mainnet),
            Origin::Rollup(rollup_index) => self.rollup_tree(rollup_index),
        }
    }

    /// Append a leaf to the mainnet tree or to a rollup's local tree.
    pub fn insert(&mut self, origin: Origin, leaf: B256) -> Result<GlobalIndex> {
        let rollup_count = self.rollup_count();
        let tree = match origin {
            Origin::Mainnet => &mut self.mainnet,
            Origin::Rollup(rollup_index) => self
                .rollups
                .get_mut(rollup_index as usize)
                .ok_or_else(|| ExitTreeError::out_of_range(U256::from(rollup_index), U256::from(rollup_count)))?,
        };
        let local_index = tree.insert(leaf)? as u32;
        let index = match origin {
            Origin::Mainnet => GlobalIndex::mainnet(local_index),
            Origin::Rollup(rollup_index) => GlobalIndex::rollup(rollup_index, local_index),
        };
        debug!(global_index = %index, ?origin, "accumulated exit leaf");
        Ok(index)
    }

    pub fn mainnet_exit_root(&self) -> B256 {
        self.mainnet.root()
    }

    pub fn local_exit_root(&self, origin: Origin) -> Result<B256> {
        Ok(self.tree(origin)?.root())
    }

    /// Rollup exit tree built fresh from the current local exit roots.
    pub fn rollup_exit_tree(&self) -> Result<ExitTree> {
        ExitTree::from_leaves(self.height, self.rollups.iter().map(ExitTree::root))
    }

    pub fn rollup_exit_root(&self) -> Result<B256> {
        Ok(self.rollup_exit_tree()?.root())
    }

    pub fn global_exit_root(&self) -> Result<GlobalExitRoot> {
        Ok(GlobalExitRoot::new(self.mainnet_exit_root(), self.rollup_exit_root()?))
    }

    /// Build both sibling paths for the leaf addressed by `index`.
    pub fn claim_proof(&self, index: GlobalIndex) -> Result<ClaimProof> {
        let rollup_exit_tree = self.rollup_exit_tree()?;
        let local_tree = self.tree(index.origin())?;
        let smt_proof_local_exit_root = local_tree.proof(u64::from(index.local_index))?;
        let smt_proof_rollup_exit_root = if index.mainnet {
            vec![B256::ZERO; self.height]
        } else {
            rollup_exit_tree.proof(u64::from(index.rollup_index))?
        };
        Ok(ClaimProof {
            global_index: index,
            smt_proof_local_exit_root,
            smt_proof_rollup_exit_root,
            mainnet_exit_root: self.mainnet.root(),
            rollup_exit_root: rollup_exit_tree.root(),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::keccak256;

    use super::*;
    use crate::tree::ZERO_HASHES;

    const HEIGHT: usize = 8;

    fn leaf(tag: &str, n: u32) -> B256 {
        keccak256(format!("{tag}-{n}"))
    }

    fn populated() -> (ExitRootAccumulator, Vec<(GlobalIndex, B256)>) {
        let mut acc = ExitRootAccumulator::new(HEIGHT).unwrap();
        let mut inserted = Vec::new();
        for _ in 0..3 {
            acc.add_rollup().unwrap();
        }
        for n in 0..4 {
            let value = leaf("mainnet", n);
            inserted.push((acc.insert(Origin::Mainnet, value).unwrap(), value));
        }
        for rollup in 0..3 {
            for n in 0..(rollup + 2) {
                let value = leaf(&format!("rollup{rollup}"), n);
                inserted.push((acc.insert(Origin::Rollup(rollup), value).unwrap(), value));
            }
        }
        (acc, inserted)
    }

    #[test]
    fn test_empty_accumulator_roots() {
        let acc = ExitRootAccumulator::new(HEIGHT).unwrap();
        let ger = acc.global_exit_root().unwrap();
        assert_eq!(ger.mainnet_exit_root, ZERO_HASHES[HEIGHT]);
        assert_eq!(ger.rollup_exit_root, ZERO_HASHES[HEIGHT]);
        assert_eq!(ger.hash(), keccak256_concat(&ZERO_HASHES[HEIGHT], &ZERO_HASHES[HEIGHT]));
    }

    #[test]
    fn test_global_exit_root_is_hash_of_both_roots() {
        let (acc, _) = populated();
        let ger = acc.global_exit_root().unwrap();
        let mut preimage = ger.mainnet_exit_root.to_vec();
        preimage.extend_from_slice(ger.rollup_exit_root.as_slice());
        assert_eq!(ger.hash(), keccak256(preimage));
    }

    #[test]
    fn test_every_leaf_has_a_valid_claim_proof() {
        let (acc, inserted) = populated();
        let ger = acc.global_exit_root().unwrap();
        for (index, value) in inserted {
            let proof = acc.claim_proof(index).unwrap();
            assert_eq!(proof.global_exit_root(), ger.hash());
            assert!(proof.verify(value).unwrap(), "{index:?}");
            assert!(!proof.verify(leaf("forged", 0)).unwrap());
        }
    }

    #[test]
    fn test_global_indexes_are_assigned_per_tree() {
        let (_, inserted) = populated();
        assert_eq!(inserted[0].0, GlobalIndex::mainnet(0));
        assert_eq!(inserted[3].0, GlobalIndex::mainnet(3));
        assert_eq!(inserted[4].0, GlobalIndex::rollup(0, 0));
        assert_eq!(inserted.last().unwrap().0, GlobalIndex::rollup(2, 3));
    }

    #[test]
    fn test_rollup_exit_tree_leaves_are_local_roots() {
        let (acc, _) = populated();
        let rollup_exit_tree = acc.rollup_exit_tree().unwrap();
        assert_eq!(rollup_exit_tree.count(), 3);
        for rollup in 0..3 {
            assert_eq!(
                rollup_exit_tree.leaf(u64::from(rollup)).unwrap(),
                acc.local_exit_root(Origin::Rollup(rollup)).unwrap()
            );
        }
    }

    #[test]
    fn test_claim_proof_goes_stale_when_other_rollup_moves() {
        let (mut acc, inserted) = populated();
        let (index, value) = inserted[4];
        let before = acc.claim_proof(index).unwrap();
        acc.insert(Origin::Rollup(1), leaf("late", 0)).unwrap();
        let after = acc.claim_proof(index).unwrap();

        assert_ne!(before.rollup_exit_root, after.rollup_exit_root);
        assert_eq!(before.smt_proof_local_exit_root, after.smt_proof_local_exit_root);
        assert!(before.verify(value).unwrap());
        assert!(after.verify(value).unwrap());
        // mixing the old rollup path with the new root fails
        let mixed = ClaimProof {
            rollup_exit_root: after.rollup_exit_root,
            ..before
        };
        assert!(!mixed.verify(value).unwrap());
    }

    #[test]
    fn test_wrong_origin_fails_verification() {
        let (acc, inserted) = populated();
        let (index, value) = inserted[5];
        let mut proof = acc.claim_proof(index).unwrap();
        proof.global_index.rollup_index += 1;
        assert!(!proof.verify(value).unwrap());
    }

    #[test]
    fn test_unknown_rollup() {
        let (mut acc, _) = populated();
        assert!(matches!(
            acc.insert(Origin::Rollup(7), B256::ZERO),
            Err(ExitTreeError::IndexOutOfRange { .. })
        ));
        assert!(acc.claim_proof(GlobalIndex::rollup(3, 0)).is_err());
    }

    #[test]
    fn test_mismatched_proof_lengths() {
        let (acc, inserted) = populated();
        let mut proof = acc.claim_proof(inserted[0].0).unwrap();
        proof.smt_proof_rollup_exit_root.pop();
        assert_eq!(
            proof.verify(inserted[0].1),
            Err(ExitTreeError::MalformedProof {
                expected: HEIGHT,
                got: HEIGHT - 1
            })
        );
    }

    #[test]
    fn test_rollup_registration_is_bounded() {
        let mut acc = ExitRootAccumulator::new(2).unwrap();
        for expected in 0..4 {
            assert_eq!(acc.add_rollup().unwrap(), expected);
        }
        assert_eq!(acc.add_rollup(), Err(ExitTreeError::CapacityExceeded { capacity: 4 }));
    }

    #[test]
    fn test_deserialize_checks_member_heights() {
        let mut acc = ExitRootAccumulator::new(4).unwrap();
        acc.add_rollup().unwrap();
        acc.insert(Origin::Rollup(0), keccak256([1u8])).unwrap();
        let json = serde_json::to_value(&acc).unwrap();
        assert_eq!(serde_json::from_value::<ExitRootAccumulator>(json.clone()).unwrap(), acc);

        let mut mismatched = json.clone();
        mismatched["rollups"][0] = serde_json::to_value(ExitTree::new(8).unwrap()).unwrap();
        let err = serde_json::from_value::<ExitRootAccumulator>(mismatched).unwrap_err();
        assert!(err.to_string().contains("member tree height differs"));

        let mut invalid = json;
        invalid["height"] = serde_json::json!(0);
        assert!(serde_json::from_value::<ExitRootAccumulator>(invalid).is_err());
    }
}
