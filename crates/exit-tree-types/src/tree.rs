//! Append-only keccak Merkle tree backing local and rollup exit roots.
//!
//! The hashing and the empty-subtree ladder match the incremental tree used by
//! the on-chain bridge, so roots computed here can be compared against
//! contract state. Unlike the frontier-only incremental variant, every node is
//! kept, which lets the tree hand out a sibling path for any slot.

use std::sync::LazyLock;

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::{ExitTreeError, Result};

pub const HASH_LENGTH: usize = 32;
pub const TREE_DEPTH: usize = 32;

/// `ZERO_HASHES[h]` is the root of an empty subtree of height `h`.
pub static ZERO_HASHES: LazyLock<[B256; TREE_DEPTH + 1]> = LazyLock::new(|| {
    let mut hashes = [B256::ZERO; TREE_DEPTH + 1];
    for height in 1..=TREE_DEPTH {
        hashes[height] = keccak256_concat(&hashes[height - 1], &hashes[height - 1]);
    }
    hashes
});

/// Hash two nodes together using Keccak256
pub fn keccak256_concat(left: &B256, right: &B256) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    let digest: [u8; HASH_LENGTH] = hasher.finalize().into();
    B256::from(digest)
}

/// Fixed-height binary Merkle tree over 32-byte leaves.
///
/// Leaves are appended left to right starting at index 0. Slots that have not
/// been written are padded with the zero-hash ladder.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(try_from = "RawExitTree")]
pub struct ExitTree {
    height: usize,
    /// `nodes[0]` holds the leaves, `nodes[height]` holds the root once the
    /// first leaf is in.
    nodes: Vec<Vec<B256>>,
}

/// Serialized form of [`ExitTree`], checked before it becomes a tree.
#[derive(Deserialize)]
struct RawExitTree {
    height: usize,
    nodes: Vec<Vec<B256>>,
}

impl TryFrom<RawExitTree> for ExitTree {
    type Error = ExitTreeError;

    /// Rebuilds the tree from its leaves and rejects stored nodes that differ.
    fn try_from(raw: RawExitTree) -> Result<Self> {
        let mut tree = Self::new(raw.height)?;
        if raw.nodes.len() != raw.height + 1 {
            return Err(ExitTreeError::CorruptTree("node levels do not match height"));
        }
        if raw.nodes[0].len() as u64 > tree.capacity() {
            return Err(ExitTreeError::CorruptTree("more leaves than the tree can hold"));
        }
        for leaf in &raw.nodes[0] {
            tree.insert(*leaf)?;
        }
        if tree.nodes != raw.nodes {
            return Err(ExitTreeError::CorruptTree("inner nodes do not match leaves"));
        }
        Ok(tree)
    }
}

impl Default for ExitTree {
    fn default() -> Self {
        Self {
            height: TREE_DEPTH,
            nodes: vec![Vec::new(); TREE_DEPTH + 1],
        }
    }
}

impl ExitTree {
    pub fn new(height: usize) -> Result<Self> {
        if height == 0 || height > TREE_DEPTH {
            return Err(ExitTreeError::InvalidHeight(height));
        }
        Ok(Self {
            height,
            nodes: vec![Vec::new(); height + 1],
        })
    }

    /// Build a tree from a sequence of leaves, inserted in order.
    pub fn from_leaves(height: usize, leaves: impl IntoIterator<Item = B256>) -> Result<Self> {
        let mut tree = Self::new(height)?;
        for leaf in leaves {
            tree.insert(leaf)?;
        }
        Ok(tree)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Maximum number of leaves, `2^height`.
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    /// Number of inserted leaves, which is also the next free index.
    pub fn count(&self) -> u64 {
        self.nodes[0].len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.count() == self.capacity()
    }

    pub fn leaves(&self) -> &[B256] {
        &self.nodes[0]
    }

    pub fn leaf(&self, index: u64) -> Option<B256> {
        usize::try_from(index).ok().and_then(|i| self.nodes[0].get(i).copied())
    }

    /// Append a leaf and refresh its path up to the root.
    ///
    /// Returns the index the leaf was stored at. A full tree is left untouched.
    pub fn insert(&mut self, leaf: B256) -> Result<u64> {
        let index = self.count();
        if index >= self.capacity() {
            return Err(ExitTreeError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.nodes[0].push(leaf);

        // The new leaf is the right-most node on every level, so a left
        // sibling always exists and a right sibling never does.
        let mut position = index as usize;
        let mut node = leaf;
        for level in 0..self.height {
            node = if position & 1 == 1 {
                keccak256_concat(&self.nodes[level][position - 1], &node)
            } else {
                keccak256_concat(&node, &ZERO_HASHES[level])
            };
            position >>= 1;
            let parents = &mut self.nodes[level + 1];
            match parents.get_mut(position) {
                Some(parent) => *parent = node,
                None => parents.push(node),
            }
        }

        debug!(index, root = %node, height = self.height, "inserted exit tree leaf");
        Ok(index)
    }

    /// Get the current root of the tree.
    pub fn root(&self) -> B256 {
        self.nodes[self.height]
            .first()
            .copied()
            .unwrap_or(ZERO_HASHES[self.height])
    }

    /// Sibling hashes from the leaf at `index` up to the root, lowest level first.
    ///
    /// Any slot inside the tree can be proven, including padding slots that
    /// have not been written yet.
    pub fn proof(&self, index: u64) -> Result<Vec<B256>> {
        if index >= self.capacity() {
            return Err(ExitTreeError::out_of_range(U256::from(index), U256::from(self.capacity())));
        }
        let mut position = index as usize;
        let siblings = (0..self.height)
            .map(|level| {
                let sibling = self.nodes[level]
                    .get(position ^ 1)
                    .copied()
                    .unwrap_or(ZERO_HASHES[level]);
                position >>= 1;
                sibling
            })
            .collect();
        Ok(siblings)
    }

    /// Check `leaf` at `index` against this tree's current root.
    pub fn verify(&self, leaf: B256, index: u64, proof: &[B256]) -> Result<bool> {
        verify_merkle_proof(leaf, index, proof, self.root(), self.height)
    }
}

/// Fold `item` with the sibling path selected by the bits of `index`.
///
/// Bit `i` set means the running node is the right child on level `i`.
pub fn branch_root(mut item: B256, branch: &[B256], index: u64) -> B256 {
    for (i, next) in branch.iter().enumerate() {
        item = match (index >> i) & 1 {
            1 => keccak256_concat(next, &item),
            _ => keccak256_concat(&item, next),
        }
    }
    item
}

/// Recompute the root from a leaf and its sibling path and compare it with `root`.
///
/// A mismatch is reported as `Ok(false)`; only a proof whose length is not
/// `height` is an error.
pub fn verify_merkle_proof(leaf: B256, index: u64, proof: &[B256], root: B256, height: usize) -> Result<bool> {
    if height == 0 || height > TREE_DEPTH {
        return Err(ExitTreeError::InvalidHeight(height));
    }
    if proof.len() != height {
        return Err(ExitTreeError::MalformedProof {
            expected: height,
            got: proof.len(),
        });
    }
    if U256::from(index) >= U256::from(1u64) << height {
        return Ok(false);
    }
    Ok(branch_root(leaf, proof, index) == root)
}
