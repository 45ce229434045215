//! Contract clients talking to deployed contracts over JSON-RPC.

use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use exit_tree_types::GlobalIndex;
use exit_tree_types::slots::{admin_slot, implementation_slot, word_to_address};
use tracing::info;

use crate::contracts::{IPolygonRollupManager, IPolygonZkEVMBridgeV2, IPolygonZkEVMGlobalExitRootV2};
use crate::error::{BridgeError, Result};
use crate::types::{ClaimRequest, source_bridge_network};
use crate::{Bridge, GlobalExitRootManager, RollupManager};

async fn eth_call<P: Provider, C: SolCall>(provider: &P, to: Address, call: C) -> Result<C::Return> {
    let tx = TransactionRequest::default().to(to).input(call.abi_encode().into());
    let output = provider.call(tx).await.map_err(|e| BridgeError::Rpc(e.to_string()))?;
    C::abi_decode_returns(&output).map_err(|e| BridgeError::Rpc(e.to_string()))
}

pub struct RpcBridge<P> {
    provider: P,
    address: Address,
}

impl<P: Provider> RpcBridge<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }

    async fn proxy_slot(&self, slot: B256) -> Result<Address> {
        let word = self
            .provider
            .get_storage_at(self.address, U256::from_be_bytes(slot.0))
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?;
        Ok(word_to_address(B256::from(word)))
    }

    /// Logic contract behind the bridge proxy.
    pub async fn implementation(&self) -> Result<Address> {
        self.proxy_slot(implementation_slot()).await
    }

    pub async fn admin(&self) -> Result<Address> {
        self.proxy_slot(admin_slot()).await
    }
}

#[async_trait]
impl<P: Provider + 'static> Bridge for RpcBridge<P> {
    async fn network_id(&self) -> Result<u32> {
        eth_call(&self.provider, self.address, IPolygonZkEVMBridgeV2::networkIDCall {}).await
    }

    async fn deposit_count(&self) -> Result<u64> {
        let count: U256 = eth_call(&self.provider, self.address, IPolygonZkEVMBridgeV2::depositCountCall {}).await?;
        u64::try_from(count).map_err(|e| BridgeError::Rpc(e.to_string()))
    }

    async fn local_exit_root(&self) -> Result<B256> {
        eth_call(&self.provider, self.address, IPolygonZkEVMBridgeV2::getRootCall {}).await
    }

    async fn is_claimed(&self, global_index: GlobalIndex) -> Result<bool> {
        let call = IPolygonZkEVMBridgeV2::isClaimedCall {
            leafIndex: global_index.local_index,
            sourceBridgeNetwork: source_bridge_network(&global_index)?,
        };
        eth_call(&self.provider, self.address, call).await
    }

    async fn claim(&self, request: &ClaimRequest) -> Result<()> {
        let tx = TransactionRequest::default()
            .to(self.address)
            .input(request.calldata()?.into());
        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| BridgeError::Rpc(e.to_string()))?;
        if !receipt.status() {
            return Err(BridgeError::Reverted(receipt.transaction_hash));
        }
        info!(
            tx_hash = %receipt.transaction_hash,
            global_index = %request.proof.global_index,
            "claim submitted"
        );
        Ok(())
    }
}

pub struct RpcGlobalExitRootManager<P> {
    provider: P,
    address: Address,
}

impl<P: Provider> RpcGlobalExitRootManager<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl<P: Provider + 'static> GlobalExitRootManager for RpcGlobalExitRootManager<P> {
    async fn last_global_exit_root(&self) -> Result<B256> {
        eth_call(
            &self.provider,
            self.address,
            IPolygonZkEVMGlobalExitRootV2::getLastGlobalExitRootCall {},
        )
        .await
    }

    async fn last_mainnet_exit_root(&self) -> Result<B256> {
        eth_call(
            &self.provider,
            self.address,
            IPolygonZkEVMGlobalExitRootV2::lastMainnetExitRootCall {},
        )
        .await
    }

    async fn last_rollup_exit_root(&self) -> Result<B256> {
        eth_call(
            &self.provider,
            self.address,
            IPolygonZkEVMGlobalExitRootV2::lastRollupExitRootCall {},
        )
        .await
    }

    async fn global_exit_root_timestamp(&self, global_exit_root: B256) -> Result<Option<u64>> {
        let call = IPolygonZkEVMGlobalExitRootV2::globalExitRootMapCall {
            globalExitRoot: global_exit_root,
        };
        let timestamp: U256 = eth_call(&self.provider, self.address, call).await?;
        if timestamp.is_zero() {
            return Ok(None);
        }
        u64::try_from(timestamp)
            .map(Some)
            .map_err(|e| BridgeError::Rpc(e.to_string()))
    }
}

pub struct RpcRollupManager<P> {
    provider: P,
    address: Address,
}

impl<P: Provider> RpcRollupManager<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl<P: Provider + 'static> RollupManager for RpcRollupManager<P> {
    async fn rollup_count(&self) -> Result<u32> {
        eth_call(&self.provider, self.address, IPolygonRollupManager::rollupCountCall {}).await
    }

    async fn rollup_exit_root(&self) -> Result<B256> {
        eth_call(&self.provider, self.address, IPolygonRollupManager::getRollupExitRootCall {}).await
    }
}
