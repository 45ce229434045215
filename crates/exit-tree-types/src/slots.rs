//! EIP-1967 proxy slots, read when inspecting the upgradeable bridge deployment.

use alloy_primitives::{Address, B256, U256, keccak256};

/// `bytes32(uint256(keccak256(label)) - 1)`, the EIP-1967 slot derivation.
pub fn eip1967_slot(label: &str) -> B256 {
    let slot = U256::from_be_bytes(keccak256(label).0) - U256::from(1);
    B256::from(slot.to_be_bytes::<32>())
}

pub fn implementation_slot() -> B256 {
    eip1967_slot("eip1967.proxy.implementation")
}

pub fn admin_slot() -> B256 {
    eip1967_slot("eip1967.proxy.admin")
}

/// Address stored in the low 20 bytes of a storage word.
pub fn word_to_address(word: B256) -> Address {
    Address::from_word(word)
}
