use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};

use crate::error::{ExitTreeError, Result};

/// Length of the tightly packed leaf preimage:
/// type (1) + origin network (4) + origin address (20) + destination network (4)
/// + destination address (20) + amount (32) + metadata hash (32).
pub const LEAF_PREIMAGE_LENGTH: usize = 113;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LeafType {
    Asset = 0,
    Message = 1,
}

impl TryFrom<u8> for LeafType {
    type Error = ExitTreeError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(LeafType::Asset),
            1 => Ok(LeafType::Message),
            other => Err(ExitTreeError::InvalidLeafType(other)),
        }
    }
}

/// One bridge transfer as it is committed to a local exit tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeLeaf {
    pub leaf_type: LeafType,
    pub origin_network: u32,
    pub origin_address: Address,
    pub destination_network: u32,
    pub destination_address: Address,
    pub amount: U256,
    pub metadata_hash: B256,
}

impl BridgeLeaf {
    pub fn value(&self) -> B256 {
        encode_leaf(
            self.leaf_type,
            self.origin_network,
            self.origin_address,
            self.destination_network,
            self.destination_address,
            self.amount,
            self.metadata_hash,
        )
    }
}

pub fn pack_leaf(
    leaf_type: LeafType,
    origin_network: u32,
    origin_address: Address,
    destination_network: u32,
    destination_address: Address,
    amount: U256,
    metadata_hash: B256,
) -> [u8; LEAF_PREIMAGE_LENGTH] {
    let mut packed = [0u8; LEAF_PREIMAGE_LENGTH];
    packed[0] = leaf_type as u8;
    packed[1..5].copy_from_slice(&origin_network.to_be_bytes());
    packed[5..25].copy_from_slice(origin_address.as_slice());
    packed[25..29].copy_from_slice(&destination_network.to_be_bytes());
    packed[29..49].copy_from_slice(destination_address.as_slice());
    packed[49..81].copy_from_slice(&amount.to_be_bytes::<32>());
    packed[81..].copy_from_slice(metadata_hash.as_slice());
    packed
}

/// Leaf value of a bridge transfer, `keccak256(encodePacked(...))`.
pub fn encode_leaf(
    leaf_type: LeafType,
    origin_network: u32,
    origin_address: Address,
    destination_network: u32,
    destination_address: Address,
    amount: U256,
    metadata_hash: B256,
) -> B256 {
    keccak256(pack_leaf(
        leaf_type,
        origin_network,
        origin_address,
        destination_network,
        destination_address,
        amount,
        metadata_hash,
    ))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{FixedBytes, address};
    use alloy_sol_types::SolValue;

    use super::*;

    fn sample() -> BridgeLeaf {
        BridgeLeaf {
            leaf_type: LeafType::Asset,
            origin_network: 0,
            origin_address: address!("6a809b36caf0d46a935ee76835065ec5a8b3cea7"),
            destination_network: 1,
            destination_address: address!("a7578551bae89a96c3365b93493ad2d4ebcbae97"),
            amount: U256::from(1_000_000_000_000_000_000u64),
            metadata_hash: keccak256(b""),
        }
    }

    #[test]
    fn test_packing_matches_solidity_encode_packed() {
        let leaf = sample();
        let packed = pack_leaf(
            leaf.leaf_type,
            leaf.origin_network,
            leaf.origin_address,
            leaf.destination_network,
            leaf.destination_address,
            leaf.amount,
            leaf.metadata_hash,
        );
        let expected = (
            FixedBytes::<1>::from([leaf.leaf_type as u8]),
            leaf.origin_network,
            leaf.origin_address,
            leaf.destination_network,
            leaf.destination_address,
            leaf.amount,
            leaf.metadata_hash,
        )
            .abi_encode_packed();
        assert_eq!(packed.len(), LEAF_PREIMAGE_LENGTH);
        assert_eq!(packed.to_vec(), expected);
        assert_eq!(leaf.value(), keccak256(expected));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(sample().value(), sample().value());
    }

    #[test]
    fn test_every_field_changes_the_leaf() {
        let base = sample().value();
        let variants = [
            BridgeLeaf {
                leaf_type: LeafType::Message,
                ..sample()
            },
            BridgeLeaf {
                origin_network: 7,
                ..sample()
            },
            BridgeLeaf {
                origin_address: Address::ZERO,
                ..sample()
            },
            BridgeLeaf {
                destination_network: 2,
                ..sample()
            },
            BridgeLeaf {
                destination_address: Address::ZERO,
                ..sample()
            },
            BridgeLeaf {
                amount: U256::from(1),
                ..sample()
            },
            BridgeLeaf {
                metadata_hash: B256::ZERO,
                ..sample()
            },
        ];
        for variant in variants {
            assert_ne!(variant.value(), base, "{variant:?}");
        }
    }

    #[test]
    fn test_leaf_type_conversion() {
        assert_eq!(LeafType::try_from(0).unwrap(), LeafType::Asset);
        assert_eq!(LeafType::try_from(1).unwrap(), LeafType::Message);
        assert_eq!(LeafType::try_from(2), Err(ExitTreeError::InvalidLeafType(2)));
    }
}
