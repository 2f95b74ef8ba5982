use anyhow::{Context, Result};
use clap::Parser;
use k256::ecdsa::SigningKey;
use serde::Serialize;
use zeroize::{Zeroize, Zeroizing};

use airdrop_merkle::signature::{claim_message, evm_address, signing_key_from_hex};
use airdrop_merkle::{hash_message, hex_encode, sign_claim, AirdropConfig};

#[derive(Parser, Debug)]
#[command(name = "sign")]
#[command(about = "Sign a message with an EVM key (personal_sign)", long_about = None)]
pub struct Cli {
    /// Private key (hex format, with or without 0x prefix).
    /// Use "-" to read it from stdin (more secure)
    #[arg(short = 'k', long)]
    private_key: String,

    /// Raw message to sign
    #[arg(short, long, conflicts_with = "amount", required_unless_present = "amount")]
    message: Option<String>,

    /// Build the claim message for this amount instead of signing a raw message
    #[arg(long)]
    amount: Option<String>,

    /// Native recipient bound into the claim message
    #[arg(short, long, requires = "amount")]
    recipient: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignOutput {
    address: String,
    message: String,
    msg_hash: String,
    signature: String,
}

/// Parses a private key argument, reading it from stdin when it is `-`.
pub fn read_private_key(arg: &str) -> Result<SigningKey> {
    let key_str = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read private key from stdin")?;
        let trimmed = Zeroizing::new(buffer.trim().to_string());
        buffer.zeroize();
        trimmed
    } else {
        Zeroizing::new(arg.to_string())
    };
    signing_key_from_hex(&key_str).context("Invalid private key")
}

pub fn run(args: &Cli, config: &AirdropConfig) -> Result<()> {
    let signing_key = read_private_key(&args.private_key)?;
    let address = hex_encode(evm_address(signing_key.verifying_key()));

    let message = match (&args.message, &args.amount) {
        (Some(message), _) => message.clone(),
        (None, Some(amount)) => claim_message(
            config.claim_message_format,
            &address,
            amount,
            args.recipient.as_deref(),
        )
        .context("Failed to build claim message")?,
        (None, None) => anyhow::bail!("Either --message or --amount is required"),
    };

    let signature = sign_claim(&signing_key, &message).context("Failed to sign message")?;
    let output = SignOutput {
        address,
        msg_hash: hex_encode(hash_message(&message)),
        message,
        signature: signature.to_hex(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize output")?
    );

    Ok(())
}
