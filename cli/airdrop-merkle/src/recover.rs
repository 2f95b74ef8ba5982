use anyhow::{Context, Result};
use clap::Parser;

use airdrop_merkle::{hex_encode, recover_signer, verify_signature, EvmSignature};

#[derive(Parser, Debug)]
#[command(name = "recover")]
#[command(about = "Recover the EVM address that signed a message", long_about = None)]
pub struct Cli {
    /// Signed message (personal_sign prefix is applied)
    #[arg(short, long, conflicts_with = "msg_hash", required_unless_present = "msg_hash")]
    message: Option<String>,

    /// Already prefixed and hashed message, hex
    #[arg(long, requires = "address")]
    msg_hash: Option<String>,

    /// Signature, hex (r || s || v)
    #[arg(short, long)]
    signature: String,

    /// Expected signer; fail unless the signature recovers to it
    #[arg(short, long)]
    address: Option<String>,
}

pub fn run(args: &Cli) -> Result<()> {
    if let Some(msg_hash) = &args.msg_hash {
        let address = args.address.as_deref().unwrap_or_default();
        let check = verify_signature(address, &args.signature, msg_hash);
        println!("Recovered address: {}", check.recovered_address);
        println!("Public key: {}", check.public_key);
        if !check.is_valid {
            anyhow::bail!("Signature was not produced by {}", address);
        }
        return Ok(());
    }

    let message = args
        .message
        .as_deref()
        .context("Either --message or --msg-hash is required")?;
    let signature = EvmSignature::from_hex(&args.signature).context("Invalid signature")?;
    let recovered = hex_encode(
        recover_signer(message, &signature).context("Failed to recover signer")?,
    );
    println!("Recovered address: {}", recovered);

    if let Some(expected) = &args.address {
        let expected = airdrop_merkle::Namespace::Evm
            .normalize_address(expected)
            .context("Invalid expected address")?;
        if expected != recovered {
            anyhow::bail!("Signature was produced by {}, not {}", recovered, expected);
        }
    }

    Ok(())
}
