use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use airdrop_merkle::msg::ExecuteMsg;
use airdrop_merkle::signature::claim_message;
use airdrop_merkle::{
    hash_message, hex_encode, verify_hex, verify_signature, AirdropConfig, RootRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "verify")]
#[command(about = "Check a claim message against the published roots", long_about = None)]
pub struct Cli {
    /// Claim JSON produced by `claim`
    #[arg(short, long)]
    claim: PathBuf,

    /// Native claimant (the transaction sender) or, for EVM claims, the recipient
    #[arg(short, long)]
    address: Option<String>,

    /// Registry file (overrides the config)
    #[arg(long)]
    registry: Option<PathBuf>,
}

pub fn run(args: &Cli, config: &AirdropConfig) -> Result<()> {
    let config = config.with_registry(args.registry.clone());

    let content = fs::read_to_string(&args.claim).context("Failed to read claim file")?;
    let msg: ExecuteMsg = serde_json::from_str(&content).context("Failed to parse claim JSON")?;
    let namespace = msg.namespace().context("Not a claim message")?;
    let registry =
        RootRegistry::load(&config.registry_path).context("Failed to load registry")?;
    let root_hex = |index: u32| registry.get_root(index, namespace).map(hex_encode);

    let valid = match &msg {
        ExecuteMsg::TerraClaim {
            amount,
            merkle_proof,
            root_index,
        } => {
            let address = args
                .address
                .as_deref()
                .context("Native claims are verified for the sender: pass --address")?;
            let root = root_hex(*root_index)?;
            let proof_ok = verify_hex(namespace, address, amount, merkle_proof, &root);
            println!("Merkle proof: {}", verdict(proof_ok));
            proof_ok
        }
        ExecuteMsg::EvmClaim {
            eth_address,
            claim_amount,
            merkle_proof,
            root_index,
            signature,
            msg_hash,
        } => {
            let root = root_hex(*root_index)?;
            let proof_ok = verify_hex(namespace, eth_address, claim_amount, merkle_proof, &root);
            println!("Merkle proof: {}", verdict(proof_ok));

            let check = verify_signature(eth_address, signature, msg_hash);
            println!("Signature: {}", verdict(check.is_valid));
            if !check.is_valid {
                warn!("Signature recovers to '{}'", check.recovered_address);
            }

            let binding_ok = match claim_message(
                config.claim_message_format,
                eth_address,
                claim_amount,
                args.address.as_deref(),
            ) {
                Ok(expected) => {
                    hex_encode(hash_message(&expected)).eq_ignore_ascii_case(
                        airdrop_merkle::common::strip_hex_prefix(msg_hash),
                    )
                }
                Err(e) => {
                    warn!("Cannot rebuild claim message: {}", e);
                    false
                }
            };
            println!("Message binding: {}", verdict(binding_ok));

            proof_ok && check.is_valid && binding_ok
        }
        ExecuteMsg::UpdateConfig { .. } => false,
    };

    if !valid {
        anyhow::bail!("Claim verification failed");
    }
    info!("Claim is valid");
    Ok(())
}

fn verdict(ok: bool) -> &'static str {
    if ok {
        "valid"
    } else {
        "INVALID"
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::Value;

    use super::*;
    use crate::test_utils::{Workspace, EVM_KEY};

    fn tamper(path: &Path, field: &str, value: &str) {
        let mut msg: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        msg["evm_claim"][field] = Value::String(value.to_string());
        fs::write(path, serde_json::to_string(&msg).unwrap()).unwrap();
    }

    fn evm_claim(ws: &Workspace) -> std::path::PathBuf {
        ws.claim(
            "evm.json",
            &["-k", EVM_KEY, "-r", "terra1alice", "-m", "500", "--round", "0"],
        )
        .unwrap()
    }

    #[test]
    fn test_native_claim_verifies_for_sender_only() {
        let ws = Workspace::published();
        let claim = ws
            .claim("native.json", &["-a", "terra1alice", "-m", "100", "--round", "0"])
            .unwrap();

        ws.verify(&claim, Some("terra1alice")).unwrap();
        assert!(ws.verify(&claim, Some("terra1bob")).is_err());
        assert!(ws.verify(&claim, None).is_err());
    }

    #[test]
    fn test_evm_claim_verifies_for_bound_recipient() {
        let ws = Workspace::published();
        let claim = evm_claim(&ws);

        ws.verify(&claim, Some("terra1alice")).unwrap();
        assert!(ws.verify(&claim, Some("terra1mallory")).is_err());
        assert!(ws.verify(&claim, None).is_err());
    }

    #[test]
    fn test_tampered_msg_hash_fails() {
        let ws = Workspace::published();
        let claim = evm_claim(&ws);
        tamper(
            &claim,
            "msg_hash",
            &hex_encode(hash_message("f39fd6e51aad88f6f4ce6ab8827279cfffb92266terra1mallory500")),
        );
        assert!(ws.verify(&claim, Some("terra1alice")).is_err());
    }

    #[test]
    fn test_tampered_amount_fails() {
        let ws = Workspace::published();
        let claim = evm_claim(&ws);
        tamper(&claim, "claim_amount", "5000");
        assert!(ws.verify(&claim, Some("terra1alice")).is_err());
    }

    #[test]
    fn test_unpublished_round_and_admin_message() {
        let ws = Workspace::published();
        let claim = ws
            .claim("native.json", &["-a", "terra1alice", "-m", "100", "--round", "0"])
            .unwrap();
        let mut msg: Value = serde_json::from_str(&fs::read_to_string(&claim).unwrap()).unwrap();
        msg["terra_claim"]["root_index"] = Value::from(3);
        fs::write(&claim, serde_json::to_string(&msg).unwrap()).unwrap();
        let err = ws.verify(&claim, Some("terra1alice")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<airdrop_merkle::AirdropError>(),
            Some(airdrop_merkle::AirdropError::UnknownRound { index: 3, .. })
        ));

        let update = ws.path("update.json");
        fs::write(&update, r#"{"update_config":{"native_merkle_roots":[]}}"#).unwrap();
        assert!(ws.verify(&update, None).is_err());
    }
}
