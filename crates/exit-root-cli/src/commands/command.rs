use std::fs;
use std::path::Path;

use alloy::providers::ProviderBuilder;
use alloy::transports::http::reqwest::Url;
use alloy_primitives::{Address, B256, U256, keccak256};
use anyhow::{Context, Result, bail};
use bridge_client::rpc::{RpcBridge, RpcGlobalExitRootManager, RpcRollupManager};
use bridge_client::{Bridge, GlobalExitRootManager, RollupManager};
use exit_tree_types::{LeafType, decode_global_index, encode_global_index, encode_leaf};
use storage::ExitTreeSnapshotStore;
use tracing::info;

use crate::commands::cli::{Network, VERSION};
use crate::config::Config;
use crate::scenario::{ClaimOutput, Scenario};

pub fn init() -> Result<()> {
    let config_path = Config::init()?;
    println!("config: {}", config_path.display());
    Ok(())
}

pub fn version() {
    println!("version: {VERSION}");
}

#[allow(clippy::too_many_arguments)]
pub fn leaf_value(
    leaf_type: LeafType,
    origin_network: u32,
    origin_address: Address,
    destination_network: u32,
    destination_address: Address,
    amount: U256,
    metadata: &str,
) -> Result<B256> {
    let metadata = hex::decode(metadata.trim_start_matches("0x")).context("metadata must be hex")?;
    Ok(encode_leaf(
        leaf_type,
        origin_network,
        origin_address,
        destination_network,
        destination_address,
        amount,
        keccak256(&metadata),
    ))
}

pub fn global_index_encode(local_index: u64, rollup_index: u64, mainnet: bool) -> Result<U256> {
    Ok(encode_global_index(local_index, rollup_index, mainnet)?)
}

pub fn global_index_decode(value: U256) -> Result<String> {
    let (local_index, rollup_index, mainnet) = decode_global_index(value)?;
    Ok(format!(
        "local_index: {local_index}\nrollup_index: {rollup_index}\nmainnet: {mainnet}"
    ))
}

pub fn claim(
    config: &Config,
    scenario: &Path,
    deposit: usize,
    output: Option<&Path>,
    persist: bool,
) -> Result<ClaimOutput> {
    let scenario = Scenario::load(scenario)?;
    let store = if persist {
        Some(ExitTreeSnapshotStore::new(&config.storage_path)?)
    } else {
        None
    };

    let claim = scenario.claim(deposit, config.tree_height, store.as_ref())?;
    let json = serde_json::to_string_pretty(&claim)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            info!("wrote claim for {} to {}", claim.proof.global_index, path.display());
        }
        None => println!("{json}"),
    }
    Ok(claim)
}

pub fn verify(claim: &Path) -> Result<()> {
    let json = fs::read_to_string(claim).with_context(|| format!("Failed to read claim {}", claim.display()))?;
    let claim: ClaimOutput = serde_json::from_str(&json)?;
    if !claim.verify()? {
        bail!("claim {} does not verify against {}", claim.proof.global_index, claim.global_exit_root);
    }
    println!("valid claim {} against {}", claim.proof.global_index, claim.global_exit_root);
    Ok(())
}

/// The rollup bridge must report the network id the config was written for.
pub fn check_network_id(configured: u32, reported: u32) -> Result<()> {
    if configured != reported {
        bail!("bridge reports network id {reported}, config expects {configured}");
    }
    Ok(())
}

pub async fn status(config: &Config, network: Network) -> Result<()> {
    let rpc_url = match network {
        Network::L1 => &config.rpc.l1_rpc,
        Network::L2 => &config.rpc.l2_rpc,
    };
    let url: Url = rpc_url.parse().with_context(|| format!("invalid rpc url {rpc_url}"))?;
    info!("querying contracts at {url}");

    let bridge = RpcBridge::new(ProviderBuilder::new().connect_http(url.clone()), config.rpc.bridge_address);
    let network_id = bridge.network_id().await?;
    if let Network::L2 = network {
        check_network_id(config.network_id, network_id)?;
    }
    println!("network_id: {network_id}");
    println!("implementation: {}", bridge.implementation().await?);
    println!("proxy_admin: {}", bridge.admin().await?);
    println!("deposit_count: {}", bridge.deposit_count().await?);
    println!("local_exit_root: {}", bridge.local_exit_root().await?);

    if let Network::L1 = network {
        let manager = RpcGlobalExitRootManager::new(
            ProviderBuilder::new().connect_http(url.clone()),
            config.rpc.global_exit_root_manager_address,
        );
        println!("last_global_exit_root: {}", manager.last_global_exit_root().await?);
        println!("last_mainnet_exit_root: {}", manager.last_mainnet_exit_root().await?);
        println!("last_rollup_exit_root: {}", manager.last_rollup_exit_root().await?);

        let rollup_manager =
            RpcRollupManager::new(ProviderBuilder::new().connect_http(url), config.rpc.rollup_manager_address);
        println!("rollup_count: {}", rollup_manager.rollup_count().await?);
    }

    Ok(())
}
