//! Random filler leaves for test scenarios.
//!
//! Fillers only occupy slots so that a leaf of interest lands at a chosen
//! index; nobody ever proves them. The trees themselves always pad with the
//! deterministic zero ladder.

use alloy_primitives::B256;

use crate::error::Result;
use crate::tree::ExitTree;

pub fn random_leaf() -> B256 {
    B256::from(rand::random::<[u8; 32]>())
}

/// Append `count` random leaves to `tree`.
pub fn fill_random(tree: &mut ExitTree, count: u64) -> Result<()> {
    for _ in 0..count {
        tree.insert(random_leaf())?;
    }
    Ok(())
}

/// Rollup exit tree holding `local_exit_root` at `rollup_index`, preceded by
/// random roots and followed by `trailing` more.
pub fn rollup_exit_tree_with_fillers(
    height: usize,
    local_exit_root: B256,
    rollup_index: u32,
    trailing: u64,
) -> Result<ExitTree> {
    let mut tree = ExitTree::new(height)?;
    fill_random(&mut tree, u64::from(rollup_index))?;
    tree.insert(local_exit_root)?;
    fill_random(&mut tree, trailing)?;
    Ok(tree)
}
