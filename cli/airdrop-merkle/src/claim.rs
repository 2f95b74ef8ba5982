use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use airdrop_merkle::msg::ExecuteMsg;
use airdrop_merkle::records::{detect_namespace, group_by_namespace, load_records};
use airdrop_merkle::signature::evm_address;
use airdrop_merkle::{
    hex_encode, write_file_atomic, AirdropConfig, EligibilityRecord, MerkleTree, Namespace,
    RootRegistry, SignedClaim,
};

use crate::sign::read_private_key;

#[derive(Parser, Debug)]
#[command(name = "claim")]
#[command(about = "Generate an airdrop claim message", long_about = None)]
pub struct Cli {
    /// Eligibility snapshot the published root was built from
    #[arg(short, long)]
    input: PathBuf,

    /// Namespace of the claimant (default: inferred from the address).
    /// The snapshot is always split by address format, as `build-tree` does
    #[arg(short, long)]
    namespace: Option<Namespace>,

    /// Claimant address; EVM claims derive it from the private key when omitted
    #[arg(short, long)]
    address: Option<String>,

    /// Claim amount in the smallest token unit
    #[arg(short = 'm', long)]
    amount: String,

    /// Round (root index) the claim is proven against
    #[arg(long)]
    round: u32,

    /// EVM private key (hex, with or without 0x prefix).
    /// Use "-" to read it from stdin (more secure)
    #[arg(short = 'k', long)]
    private_key: Option<String>,

    /// Native account receiving an EVM claim's tokens
    #[arg(short = 'r', long)]
    recipient: Option<String>,

    /// Registry file (overrides the config)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Output JSON file
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(args: Cli, config: &AirdropConfig) -> Result<()> {
    let config = config.with_registry(args.registry.clone());

    let signing_key = args
        .private_key
        .as_deref()
        .map(read_private_key)
        .transpose()?;
    let key_address = signing_key
        .as_ref()
        .map(|key| hex_encode(evm_address(key.verifying_key())));

    let namespace = match (args.namespace, &args.address, &key_address) {
        (Some(namespace), _, _) => namespace,
        (None, Some(address), _) => detect_namespace(address),
        (None, None, Some(_)) => Namespace::Evm,
        (None, None, None) => anyhow::bail!("Either --address or --private-key is required"),
    };

    let address = match (namespace, &args.address, &key_address) {
        (Namespace::Evm, Some(given), Some(derived)) => {
            let given = namespace.normalize_address(given)?;
            if &given != derived {
                anyhow::bail!(
                    "Private key controls {} but the claim is for {}",
                    derived,
                    given
                );
            }
            given
        }
        (Namespace::Evm, None, Some(derived)) => derived.clone(),
        (Namespace::Evm, _, None) => anyhow::bail!("EVM claims must be signed: pass --private-key"),
        (Namespace::Native, Some(given), _) => namespace.normalize_address(given)?,
        (Namespace::Native, None, _) => anyhow::bail!("Native claims need --address"),
    };

    info!("Loading eligibility snapshot...");
    let records = load_records(&args.input)
        .with_context(|| format!("Failed to load records from {}", args.input.display()))?;
    let records = group_by_namespace(records, None)
        .into_iter()
        .find(|(group, _)| *group == namespace)
        .map(|(_, records)| records)
        .with_context(|| format!("No {} records in snapshot", namespace))?;

    info!("Building {} Merkle tree...", namespace);
    let tree = MerkleTree::build(namespace, &records, config.duplicate_policy)
        .context("Failed to build Merkle tree")?;

    info!("Checking root against round {}...", args.round);
    let registry =
        RootRegistry::load(&config.registry_path).context("Failed to load registry")?;
    registry
        .resolve(args.round, namespace, &tree.root())
        .context("Snapshot does not match the published round")?;

    info!("Generating Merkle proof...");
    let record = EligibilityRecord::new(address.clone(), args.amount.clone());
    let proof = tree
        .proof(&record)
        .context("Address and amount not found in eligibility list")?;

    let msg = match (namespace, &signing_key) {
        (Namespace::Native, _) => ExecuteMsg::terra_claim(&args.amount, &proof, args.round),
        (Namespace::Evm, Some(key)) => {
            info!("Signing claim message...");
            let claim = SignedClaim::sign(
                key,
                config.claim_message_format,
                &args.amount,
                args.recipient.as_deref(),
            )
            .context("Failed to sign claim")?;
            info!("Signed message: {}", claim.message);
            ExecuteMsg::evm_claim(&claim, &proof, args.round)
        }
        (Namespace::Evm, None) => anyhow::bail!("EVM claims must be signed: pass --private-key"),
    };

    info!("Writing claim JSON to {:?}...", args.output);
    let json_output = serde_json::to_string_pretty(&msg).context("Failed to serialize JSON")?;
    write_file_atomic(&args.output, &json_output).context("Failed to write claim file")?;

    println!("Claimant: {}", address);
    println!("Root: {}", tree.root_hex());
    println!("Proof length: {} nodes", proof.len());

    Ok(())
}
