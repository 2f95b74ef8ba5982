#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use airdrop_merkle::AirdropConfig;

mod build_tree;
mod claim;
mod publish;
mod recover;
mod sign;
mod verify;

#[cfg(test)]
mod test_utils;

#[derive(Parser, Debug)]
#[command(name = "airdrop")]
#[command(about = "Airdrop Merkle eligibility tools", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file (duplicate policy, claim message format, registry path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    BuildTree(build_tree::Cli),
    Claim(claim::Cli),
    Verify(verify::Cli),
    Sign(sign::Cli),
    Recover(recover::Cli),
    Publish(publish::Cli),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AirdropConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args, &config)?,
        Commands::Claim(args) => claim::run(args, &config)?,
        Commands::Verify(args) => verify::run(&args, &config)?,
        Commands::Sign(args) => sign::run(&args, &config)?,
        Commands::Recover(args) => recover::run(&args)?,
        Commands::Publish(args) => publish::run(args, &config)?,
    }

    Ok(())
}
