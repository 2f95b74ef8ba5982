use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

use airdrop_merkle::records::{group_by_namespace, load_records};
use airdrop_merkle::{
    write_file_atomic, AirdropConfig, EligibilityRecord, MerkleTree, Namespace, RootRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "build-tree")]
#[command(about = "Build Merkle trees from an eligibility snapshot", long_about = None)]
pub struct Cli {
    /// Snapshot: JSON array of {address, amount} or `address,amount` lines
    #[arg(short, long)]
    input: PathBuf,

    /// Build a single namespace from every record (default: split by address format)
    #[arg(short, long)]
    namespace: Option<Namespace>,

    /// Output file for the Merkle roots (JSON, namespace -> hex root)
    #[arg(short, long)]
    root_output: Option<PathBuf>,

    /// Output file for the proof book (every claimant's amount and proof)
    #[arg(short, long)]
    proofs_output: Option<PathBuf>,

    /// Append the roots to the registry as a new round
    #[arg(long)]
    publish: bool,

    /// Registry file (overrides the config)
    #[arg(long)]
    registry: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimEntry {
    pub address: String,
    pub amount: String,
    pub proof: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TreeProofs {
    pub root: String,
    pub claims: Vec<ClaimEntry>,
}

fn proof_entries(tree: &MerkleTree, records: &[EligibilityRecord]) -> Result<Vec<ClaimEntry>> {
    let namespace = tree.namespace();
    let mut claims = records
        .iter()
        .map(|record| {
            Ok(ClaimEntry {
                address: namespace.normalize_address(&record.address)?,
                amount: record.amount.clone(),
                proof: tree.proof(record)?.to_hex(),
            })
        })
        .collect::<airdrop_merkle::Result<Vec<_>>>()
        .context("Failed to generate proofs")?;
    claims.sort();
    claims.dedup();
    Ok(claims)
}

pub fn run(args: Cli, config: &AirdropConfig) -> Result<()> {
    let config = config.with_registry(args.registry);

    let records = load_records(&args.input)
        .with_context(|| format!("Failed to load records from {}", args.input.display()))?;
    let groups = group_by_namespace(records, args.namespace);
    if groups.is_empty() {
        anyhow::bail!("No records in {}", args.input.display());
    }

    let mut roots = BTreeMap::new();
    let mut book = BTreeMap::new();

    for (namespace, records) in groups {
        info!("Building {} tree from {} records...", namespace, records.len());
        let tree = MerkleTree::build(namespace, &records, config.duplicate_policy)
            .with_context(|| format!("Failed to build {} tree", namespace))?;

        println!("{} root: {}", namespace, tree.root_hex());
        info!(
            "{} tree: {} leaves, depth {}",
            namespace,
            tree.len(),
            tree.depth()
        );

        if args.proofs_output.is_some() {
            let claims = proof_entries(&tree, &records)?;
            book.insert(
                namespace,
                TreeProofs {
                    root: tree.root_hex(),
                    claims,
                },
            );
        }
        roots.insert(namespace, tree.root());
    }

    if let Some(path) = &args.root_output {
        let hex_roots: BTreeMap<_, _> = roots
            .iter()
            .map(|(namespace, root)| (*namespace, airdrop_merkle::hex_encode(root)))
            .collect();
        let json = serde_json::to_string_pretty(&hex_roots).context("Failed to serialize roots")?;
        write_file_atomic(path, &json).context("Failed to write root file")?;
        info!("Wrote roots to {}", path.display());
    }

    if let Some(path) = &args.proofs_output {
        let json = serde_json::to_string_pretty(&book).context("Failed to serialize proofs")?;
        write_file_atomic(path, &json).context("Failed to write proofs file")?;
        info!("Wrote proof book to {}", path.display());
    }

    if args.publish {
        let (Some(native), Some(evm)) = (roots.get(&Namespace::Native), roots.get(&Namespace::Evm))
        else {
            anyhow::bail!("Publishing a round needs both a native and an evm tree");
        };
        let mut registry = RootRegistry::load(&config.registry_path)
            .context("Failed to load registry")?;
        let index = registry.publish_round(*native, *evm);
        registry
            .save(&config.registry_path)
            .context("Failed to save registry")?;
        println!("Published round {}", index);
    }

    Ok(())
}
