use clap::Parser;
use tracing_subscriber::EnvFilter;

use exit_root_cli::commands::{
    self,
    cli::{Cli, Commands, GlobalIndexCommands},
};
use exit_root_cli::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep alloy transport noise down unless RUST_LOG asks for it
    let mut filter = EnvFilter::new("info,alloy_transport_http=warn,hyper=warn");
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        if let Ok(parsed) = env_filter.parse() {
            filter = filter.add_directive(parsed);
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Init {} => commands::command::init()?,
        Commands::Version {} => commands::command::version(),
        Commands::LeafValue {
            leaf_type,
            origin_network,
            origin_address,
            destination_network,
            destination_address,
            amount,
            metadata,
        } => {
            let leaf = commands::command::leaf_value(
                leaf_type.into(),
                origin_network,
                origin_address,
                destination_network,
                destination_address,
                amount,
                &metadata,
            )?;
            println!("{leaf}");
        }
        Commands::GlobalIndex { command } => match command {
            GlobalIndexCommands::Encode {
                local_index,
                rollup_index,
                mainnet,
            } => println!("{}", commands::command::global_index_encode(local_index, rollup_index, mainnet)?),
            GlobalIndexCommands::Decode { value } => println!("{}", commands::command::global_index_decode(value)?),
        },
        Commands::Claim {
            scenario,
            deposit,
            output,
            persist,
        } => {
            let config = Config::load()?;
            commands::command::claim(&config, &scenario, deposit, output.as_deref(), persist)?;
        }
        Commands::Verify { claim } => commands::command::verify(&claim)?,
        Commands::Status { network } => {
            let config = Config::load()?;
            commands::command::status(&config, network).await?;
        }
    }

    Ok(())
}
