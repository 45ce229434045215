use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use anyhow::{Context, Result, anyhow};
use exit_tree_types::TREE_DEPTH;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Height of every exit tree built by this tool.
    pub tree_height: usize,

    /// Network id the rollup bridge must report, checked by `status --network l2`.
    pub network_id: u32,

    /// Directory of the exit tree snapshot store.
    pub storage_path: PathBuf,

    /// Configuration for outbound RPC connections.
    pub rpc: RpcConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RpcConfig {
    /// RPC endpoint for the L1 node.
    pub l1_rpc: String,

    /// RPC endpoint for the rollup node.
    pub l2_rpc: String,

    /// Bridge contract, deployed at the same address on both networks.
    pub bridge_address: Address,

    pub global_exit_root_manager_address: Address,

    pub rollup_manager_address: Address,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            l1_rpc: "http://localhost:8545".into(),
            l2_rpc: "http://localhost:8123".into(),
            bridge_address: Address::ZERO,
            global_exit_root_manager_address: Address::ZERO,
            rollup_manager_address: Address::ZERO,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree_height: TREE_DEPTH,
            network_id: 1,
            storage_path: PathBuf::from("data/snapshots.db"),
            rpc: RpcConfig::default(),
        }
    }
}

impl Config {
    /// The default service home directory.
    pub const APP_HOME: &str = ".exit-root";
    /// The default configuration directory.
    pub const CONFIG_DIR: &str = "config";
    /// The default configuration file in YAML format.
    pub const CONFIG_FILE: &str = "config.yaml";

    fn home_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow!("cannot find home directory"))?
            .join(Self::APP_HOME))
    }

    /// Initializes the local configuration directory and writes default files if missing.
    pub fn init() -> Result<PathBuf> {
        Self::init_in(&Self::home_dir()?)
    }

    /// Same as [`Config::init`] rooted at `home_dir` instead of `~/.exit-root`.
    pub fn init_in(home_dir: &Path) -> Result<PathBuf> {
        let config_dir = home_dir.join(Self::CONFIG_DIR);
        fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join(Self::CONFIG_FILE);
        if !config_path.exists() {
            info!("creating default config at {config_path:?}");
            let config = Config {
                storage_path: home_dir.join(Config::default().storage_path),
                ..Config::default()
            };
            fs::write(&config_path, serde_yaml::to_string(&config)?)?;
        } else {
            info!("config file already exists at {config_path:?}");
        }

        Ok(config_path)
    }

    /// Returns the default application config path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(Self::CONFIG_DIR).join(Self::CONFIG_FILE))
    }

    /// Loads the application config from the service home directory.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Err(anyhow!("config file not found at {}", config_path.display()));
        }

        info!("reading config file at {}", config_path.display());
        let config_yaml = fs::read_to_string(config_path).context("Failed to read config file from path")?;
        let config = serde_yaml::from_str(&config_yaml)?;

        Ok(config)
    }
}
