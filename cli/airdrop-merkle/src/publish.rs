use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use airdrop_merkle::msg::ExecuteMsg;
use airdrop_merkle::{parse_hash, AirdropConfig, RootRegistry};

#[derive(Parser, Debug)]
#[command(name = "publish")]
#[command(about = "Append a round of Merkle roots to the registry", long_about = None)]
pub struct Cli {
    /// Root of the native-account tree (hex)
    #[arg(long)]
    native_root: String,

    /// Root of the EVM-account tree (hex)
    #[arg(long)]
    evm_root: String,

    /// Registry file (overrides the config)
    #[arg(long)]
    registry: Option<PathBuf>,
}

pub fn run(args: Cli, config: &AirdropConfig) -> Result<()> {
    let config = config.with_registry(args.registry);

    let native_root = parse_hash(&args.native_root).context("Invalid native root")?;
    let evm_root = parse_hash(&args.evm_root).context("Invalid evm root")?;

    let mut registry =
        RootRegistry::load(&config.registry_path).context("Failed to load registry")?;
    let index = registry.publish_round(native_root, evm_root);
    registry
        .save(&config.registry_path)
        .context("Failed to save registry")?;

    println!("Published round {}", index);
    let update = ExecuteMsg::update_roots(registry.to_msg());
    println!(
        "{}",
        serde_json::to_string_pretty(&update).context("Failed to serialize update message")?
    );

    Ok(())
}
