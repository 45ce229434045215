use alloy_sol_types::sol;

// Bridge deployed on every network. Claims carry both sibling paths and the
// pair of exit roots whose hash must already be a known global exit root.
sol! {
    interface IPolygonZkEVMBridgeV2 {
        function claimAsset(
            bytes32[32] calldata smtProofLocalExitRoot,
            bytes32[32] calldata smtProofRollupExitRoot,
            uint256 globalIndex,
            bytes32 mainnetExitRoot,
            bytes32 rollupExitRoot,
            uint32 originNetwork,
            address originTokenAddress,
            uint32 destinationNetwork,
            address destinationAddress,
            uint256 amount,
            bytes calldata metadata
        ) external;

        function claimMessage(
            bytes32[32] calldata smtProofLocalExitRoot,
            bytes32[32] calldata smtProofRollupExitRoot,
            uint256 globalIndex,
            bytes32 mainnetExitRoot,
            bytes32 rollupExitRoot,
            uint32 originNetwork,
            address originAddress,
            uint32 destinationNetwork,
            address destinationAddress,
            uint256 amount,
            bytes calldata metadata
        ) external;

        function isClaimed(uint32 leafIndex, uint32 sourceBridgeNetwork) external view returns (bool);

        function depositCount() external view returns (uint256);

        function getRoot() external view returns (bytes32);

        function networkID() external view returns (uint32);
    }
}

sol! {
    interface IPolygonZkEVMGlobalExitRootV2 {
        function getLastGlobalExitRoot() external view returns (bytes32);

        function globalExitRootMap(bytes32 globalExitRoot) external view returns (uint256);

        function lastMainnetExitRoot() external view returns (bytes32);

        function lastRollupExitRoot() external view returns (bytes32);
    }
}

sol! {
    interface IPolygonRollupManager {
        function rollupCount() external view returns (uint32);

        function getRollupExitRoot() external view returns (bytes32);
    }
}
