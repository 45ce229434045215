use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand, ValueEnum};
use exit_tree_types::LeafType;

pub const VERSION: &str = "v0.1.0";

#[derive(Parser)]
#[command(name = "exit-root", version = VERSION, about = "Exit tree and global exit root toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LeafKind {
    /// Token transfer
    Asset,
    /// Arbitrary message
    Message,
}

impl From<LeafKind> for LeafType {
    fn from(kind: LeafKind) -> Self {
        match kind {
            LeafKind::Asset => LeafType::Asset,
            LeafKind::Message => LeafType::Message,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Network {
    /// The L1 bridge, with the global exit root and rollup managers
    L1,
    /// The rollup bridge
    L2,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize configuration and home directory
    Init {},

    /// Show the service version
    Version {},

    /// Compute the exit tree leaf value of a bridge transfer
    LeafValue {
        #[arg(long, value_enum, default_value = "asset")]
        leaf_type: LeafKind,

        #[arg(long)]
        origin_network: u32,

        #[arg(long)]
        origin_address: Address,

        #[arg(long)]
        destination_network: u32,

        #[arg(long)]
        destination_address: Address,

        /// Decimal or 0x-prefixed hex amount
        #[arg(long)]
        amount: U256,

        /// Hex-encoded raw metadata, hashed before it enters the leaf
        #[arg(long, default_value = "")]
        metadata: String,
    },

    /// Pack or unpack global indexes
    GlobalIndex {
        #[command(subcommand)]
        command: GlobalIndexCommands,
    },

    /// Build a claim proof for one deposit of a scenario file
    Claim {
        /// JSON file listing the deposits to replay
        #[arg(long)]
        scenario: PathBuf,

        /// Position of the deposit to claim in the scenario
        #[arg(long)]
        deposit: usize,

        /// Write the claim here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Record tree snapshots and the claim in the configured store
        #[arg(long, default_value = "false")]
        persist: bool,
    },

    /// Check a claim produced by `claim`
    Verify {
        #[arg(long)]
        claim: PathBuf,
    },

    /// Query the deployed contracts
    Status {
        #[arg(long, value_enum, default_value = "l1")]
        network: Network,
    },
}

#[derive(Subcommand)]
pub enum GlobalIndexCommands {
    Encode {
        #[arg(long)]
        local_index: u64,

        #[arg(long, default_value = "0")]
        rollup_index: u64,

        #[arg(long, default_value = "false")]
        mainnet: bool,
    },

    Decode {
        /// Decimal or 0x-prefixed hex global index
        value: U256,
    },
}
