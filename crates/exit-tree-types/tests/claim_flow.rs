use alloy_primitives::{Address, B256, U256, address};
use exit_tree_types::{
    BridgeLeaf, ClaimProof, ExitRootAccumulator, ExitTree, GlobalIndex, LeafType, Origin, decode_global_index,
    encode_global_index,
    metadata::{encode_token_metadata, metadata_hash},
    verify_merkle_proof,
};

const TOKEN: Address = address!("6a809b36caf0d46a935ee76835065ec5a8b3cea7");
const RECIPIENT: Address = address!("a7578551bae89a96c3365b93493ad2d4ebcbae97");

fn filler() -> B256 {
    B256::from(rand::random::<[u8; 32]>())
}

fn deposit(destination_network: u32, amount: u64) -> BridgeLeaf {
    let metadata = encode_token_metadata("Wrapped Ether", "WETH", 18);
    BridgeLeaf {
        leaf_type: LeafType::Asset,
        origin_network: 0,
        origin_address: TOKEN,
        destination_network,
        destination_address: RECIPIENT,
        amount: U256::from(amount),
        metadata_hash: metadata_hash(&metadata),
    }
}

/// Rollup-origin claim assembled by hand: fillers in the local tree, the
/// local root placed among filler roots in the rollup exit tree.
#[test]
fn test_rollup_claim_with_filler_leaves() {
    let height = 32;
    let leaf = deposit(0, 1_000);

    let mut local_tree = ExitTree::new(height).unwrap();
    for _ in 0..5 {
        local_tree.insert(filler()).unwrap();
    }
    let local_index = local_tree.insert(leaf.value()).unwrap();
    let local_exit_root = local_tree.root();

    let rollup_index = 3u32;
    let mut rollup_tree = ExitTree::new(height).unwrap();
    for _ in 0..rollup_index {
        rollup_tree.insert(filler()).unwrap();
    }
    rollup_tree.insert(local_exit_root).unwrap();

    let mainnet_exit_root = filler();
    let global_index_value = encode_global_index(local_index, u64::from(rollup_index), false).unwrap();
    let global_index = GlobalIndex::try_from(global_index_value).unwrap();
    assert_eq!(global_index, GlobalIndex::rollup(rollup_index, 5));

    let proof = ClaimProof {
        global_index,
        smt_proof_local_exit_root: local_tree.proof(local_index).unwrap(),
        smt_proof_rollup_exit_root: rollup_tree.proof(u64::from(rollup_index)).unwrap(),
        mainnet_exit_root,
        rollup_exit_root: rollup_tree.root(),
    };

    assert!(
        verify_merkle_proof(
            leaf.value(),
            local_index,
            &proof.smt_proof_local_exit_root,
            local_exit_root,
            height
        )
        .unwrap()
    );
    assert!(proof.verify(leaf.value()).unwrap());
    assert!(!proof.verify(deposit(0, 1_001).value()).unwrap());
}

#[test]
fn test_mainnet_and_rollup_claims_share_one_global_exit_root() {
    let mut acc = ExitRootAccumulator::new(32).unwrap();
    let rollup = acc.add_rollup().unwrap();

    let to_rollup = deposit(1, 10);
    let to_mainnet = deposit(0, 20);
    let mainnet_index = acc.insert(Origin::Mainnet, to_rollup.value()).unwrap();
    let rollup_index = acc.insert(Origin::Rollup(rollup), to_mainnet.value()).unwrap();

    let ger = acc.global_exit_root().unwrap();
    let mainnet_proof = acc.claim_proof(mainnet_index).unwrap();
    let rollup_proof = acc.claim_proof(rollup_index).unwrap();

    assert_eq!(mainnet_proof.global_exit_root(), ger.hash());
    assert_eq!(rollup_proof.global_exit_root(), ger.hash());
    assert!(mainnet_proof.verify(to_rollup.value()).unwrap());
    assert!(rollup_proof.verify(to_mainnet.value()).unwrap());

    // swapping the leaves between the two proofs must fail
    assert!(!mainnet_proof.verify(to_mainnet.value()).unwrap());
    assert!(!rollup_proof.verify(to_rollup.value()).unwrap());

    assert_eq!(decode_global_index(mainnet_index.to_u256()).unwrap(), (0, 0, true));
    assert_eq!(decode_global_index(rollup_index.to_u256()).unwrap(), (0, rollup, false));
}
