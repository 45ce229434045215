use alloy_primitives::{B256, Bytes, U256, keccak256};
use alloy_sol_types::SolValue;

/// Metadata attached to a wrapped-token deposit, `abi.encode(name, symbol, decimals)`.
pub fn encode_token_metadata(name: &str, symbol: &str, decimals: u8) -> Bytes {
    (name.to_string(), symbol.to_string(), U256::from(decimals))
        .abi_encode_params()
        .into()
}

/// Hash committed to the leaf in place of the raw metadata bytes.
pub fn metadata_hash(metadata: &[u8]) -> B256 {
    keccak256(metadata)
}
