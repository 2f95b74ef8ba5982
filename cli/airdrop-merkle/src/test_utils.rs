use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use airdrop_merkle::AirdropConfig;

use crate::{build_tree, claim, verify};

/// Hardhat account #0.
pub const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const EVM_ADDRESS: &str = "f39fd6e51aad88f6f4ce6ab8827279cfffb92266";

const SNAPSHOT: &str = "address,amount
terra1alice,100
terra1bob,250
0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266,500
";

/// Mixed snapshot in a tempdir with round 0 published from it.
pub struct Workspace {
    pub dir: TempDir,
    pub snapshot: PathBuf,
    pub registry: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.csv");
        let registry = dir.path().join("roots.json");
        fs::write(&snapshot, SNAPSHOT).unwrap();
        Self {
            dir,
            snapshot,
            registry,
        }
    }

    pub fn published() -> Self {
        let ws = Self::new();
        ws.build_tree(&["--publish"]).unwrap();
        ws
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn build_tree(&self, extra: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec![
            "build-tree".to_string(),
            "-i".to_string(),
            self.snapshot.display().to_string(),
            "--registry".to_string(),
            self.registry.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        build_tree::run(build_tree::Cli::try_parse_from(argv)?, &AirdropConfig::default())
    }

    /// Runs `claim` and returns the path of the written claim file.
    pub fn claim(&self, output: &str, extra: &[&str]) -> anyhow::Result<PathBuf> {
        let output = self.path(output);
        let mut argv = vec![
            "claim".to_string(),
            "-i".to_string(),
            self.snapshot.display().to_string(),
            "--registry".to_string(),
            self.registry.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        claim::run(claim::Cli::try_parse_from(argv)?, &AirdropConfig::default())?;
        Ok(output)
    }

    pub fn verify(&self, claim: &Path, address: Option<&str>) -> anyhow::Result<()> {
        let mut argv = vec![
            "verify".to_string(),
            "-c".to_string(),
            claim.display().to_string(),
            "--registry".to_string(),
            self.registry.display().to_string(),
        ];
        if let Some(address) = address {
            argv.push("-a".to_string());
            argv.push(address.to_string());
        }
        verify::run(&verify::Cli::try_parse_from(argv)?, &AirdropConfig::default())
    }
}
