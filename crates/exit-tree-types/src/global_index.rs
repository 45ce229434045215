//! Packing of a leaf's position across both tree levels into one integer.
//!
//! Layout, least significant bit first:
//! - bits 0..32: index of the leaf in its local exit tree
//! - bits 32..64: index of the rollup's local exit root in the rollup exit tree
//! - bit 64: set when the leaf lives in the mainnet exit tree
//!
//! Mainnet indexes carry no rollup index. `encode` drops a non-zero rollup
//! index for mainnet leaves instead of rejecting it.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ExitTreeError, Result};

pub const MAINNET_FLAG_BIT: usize = 64;
const FIELD_LIMIT: u64 = 1 << 32;

/// Which tree a leaf was committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Mainnet,
    Rollup(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalIndex {
    pub local_index: u32,
    pub rollup_index: u32,
    pub mainnet: bool,
}

impl GlobalIndex {
    pub fn mainnet(local_index: u32) -> Self {
        Self {
            local_index,
            rollup_index: 0,
            mainnet: true,
        }
    }

    pub fn rollup(rollup_index: u32, local_index: u32) -> Self {
        Self {
            local_index,
            rollup_index,
            mainnet: false,
        }
    }

    pub fn origin(&self) -> Origin {
        if self.mainnet {
            Origin::Mainnet
        } else {
            Origin::Rollup(self.rollup_index)
        }
    }

    pub fn to_u256(&self) -> U256 {
        let local = U256::from(self.local_index);
        if self.mainnet {
            local + (U256::from(1) << MAINNET_FLAG_BIT)
        } else {
            local + (U256::from(self.rollup_index) << 32)
        }
    }
}

impl TryFrom<U256> for GlobalIndex {
    type Error = ExitTreeError;

    fn try_from(value: U256) -> Result<Self> {
        let (local_index, rollup_index, mainnet) = decode_global_index(value)?;
        Ok(Self {
            local_index,
            rollup_index,
            mainnet,
        })
    }
}

impl From<GlobalIndex> for U256 {
    fn from(index: GlobalIndex) -> Self {
        index.to_u256()
    }
}

impl fmt::Display for GlobalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u256())
    }
}

/// Pack a leaf position into a global index.
///
/// Both indexes must fit in 32 bits. For mainnet leaves `rollup_index` is
/// ignored.
pub fn encode_global_index(local_index: u64, rollup_index: u64, is_mainnet: bool) -> Result<U256> {
    if local_index >= FIELD_LIMIT {
        return Err(ExitTreeError::out_of_range(U256::from(local_index), U256::from(FIELD_LIMIT)));
    }
    if rollup_index >= FIELD_LIMIT {
        return Err(ExitTreeError::out_of_range(U256::from(rollup_index), U256::from(FIELD_LIMIT)));
    }
    if is_mainnet && rollup_index != 0 {
        warn!(rollup_index, local_index, "rollup index ignored for mainnet global index");
    }
    let index = if is_mainnet {
        GlobalIndex::mainnet(local_index as u32)
    } else {
        GlobalIndex::rollup(rollup_index as u32, local_index as u32)
    };
    Ok(index.to_u256())
}

/// Unpack a global index into `(local_index, rollup_index, is_mainnet)`.
///
/// Values `encode_global_index` cannot produce are rejected: any bit above the
/// mainnet flag, or a mainnet index whose remainder does not fit in 32 bits.
pub fn decode_global_index(value: U256) -> Result<(u32, u32, bool)> {
    let limbs = value.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 || limbs[1] > 1 {
        return Err(ExitTreeError::out_of_range(value, U256::from(1) << (MAINNET_FLAG_BIT + 1)));
    }
    let low = limbs[0];
    if limbs[1] == 1 {
        if low >= FIELD_LIMIT {
            return Err(ExitTreeError::out_of_range(U256::from(low), U256::from(FIELD_LIMIT)));
        }
        return Ok((low as u32, 0, true));
    }
    Ok((low as u32, (low >> 32) as u32, false))
}
