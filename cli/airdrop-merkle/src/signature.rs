//! EIP-191 ("personal sign") signatures binding an EVM key to a claim.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::common::{hex_encode, keccak256, parse_hash, strip_hex_prefix, Hash};
use crate::error::{AirdropError, Result};
use crate::leaf::{validate_amount, Namespace};
use crate::msg::SignatureResponse;

const EIP191_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Hashes a message the way `personal_sign` / `eth_sign` do:
/// `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`.
pub fn hash_message(message: impl AsRef<[u8]>) -> Hash {
    let message = message.as_ref();
    Keccak256::new()
        .chain_update(EIP191_PREFIX.as_bytes())
        .chain_update(message.len().to_string().as_bytes())
        .chain_update(message)
        .finalize()
        .into()
}

/// Maps the `v` byte of a signature to a recovery id.
///
/// Accepts raw ids (0, 1), legacy Ethereum values (27, 28) and EIP-155
/// values (`chain_id * 2 + 35 + id`).
pub fn normalize_recovery_id(v: u8) -> Option<u8> {
    match v {
        0 | 1 => Some(v),
        27 | 28 => Some(v - 27),
        v if v >= 35 => Some((v - 1) % 2),
        _ => None,
    }
}

/// Derives the 20-byte EVM address of a public key.
pub fn evm_address(verifying_key: &VerifyingKey) -> [u8; 20] {
    let encoded = verifying_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Parses a hex private key, with or without `0x` prefix.
///
/// The decoded bytes are wiped when this returns.
pub fn signing_key_from_hex(key_hex: &str) -> Result<SigningKey> {
    let cleaned = strip_hex_prefix(key_hex);
    if cleaned.is_empty() {
        return Err(AirdropError::InvalidPrivateKey);
    }
    let key_bytes =
        Zeroizing::new(hex::decode(cleaned).map_err(|_| AirdropError::InvalidPrivateKey)?);
    if key_bytes.len() != 32 {
        return Err(AirdropError::InvalidPrivateKey);
    }
    SigningKey::from_slice(&key_bytes).map_err(|_| AirdropError::InvalidPrivateKey)
}

/// A 65-byte `r || s || v` signature with `v` in {27, 28}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmSignature([u8; 65]);

impl EvmSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 65] = bytes.try_into().map_err(|_| {
            AirdropError::InvalidSignature(format!("expected 65 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| AirdropError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex_encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    fn parts(&self) -> Result<(Signature, RecoveryId)> {
        let signature = Signature::from_slice(&self.0[..64])
            .map_err(|e| AirdropError::InvalidSignature(e.to_string()))?;
        let recovery_id = normalize_recovery_id(self.v())
            .and_then(RecoveryId::from_byte)
            .ok_or_else(|| AirdropError::InvalidSignature(format!("bad v value {}", self.v())))?;
        Ok((signature, recovery_id))
    }
}

/// Signs an already EIP-191 hashed message.
pub fn sign_prehash(signing_key: &SigningKey, msg_hash: &Hash) -> Result<EvmSignature> {
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(msg_hash)
        .map_err(|e| AirdropError::InvalidSignature(e.to_string()))?;
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = 27 + recovery_id.to_byte();
    Ok(EvmSignature(bytes))
}

/// Signs `message` with the personal-sign prefix.
pub fn sign_claim(signing_key: &SigningKey, message: &str) -> Result<EvmSignature> {
    sign_prehash(signing_key, &hash_message(message))
}

/// Recovers the public key that signed `msg_hash`.
pub fn recover_prehash(msg_hash: &Hash, signature: &EvmSignature) -> Result<VerifyingKey> {
    let (signature, recovery_id) = signature.parts()?;
    VerifyingKey::recover_from_prehash(msg_hash, &signature, recovery_id)
        .map_err(|e| AirdropError::InvalidSignature(e.to_string()))
}

/// Recovers the address that signed `message`.
///
/// A signature over a different message recovers a different address; callers
/// compare the result with the claimed address.
pub fn recover_signer(message: &str, signature: &EvmSignature) -> Result<[u8; 20]> {
    recover_prehash(&hash_message(message), signature).map(|key| evm_address(&key))
}

/// Result of checking a signature against a claimed address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureCheck {
    pub is_valid: bool,
    /// Uncompressed SEC1 public key, hex.
    pub public_key: String,
    pub recovered_address: String,
}

impl From<SignatureCheck> for SignatureResponse {
    fn from(check: SignatureCheck) -> Self {
        SignatureResponse {
            is_valid: check.is_valid,
            public_key: check.public_key,
            recovered_address: check.recovered_address,
        }
    }
}

/// Answers the contract's `is_valid_signature` query off chain.
///
/// `signature_hex` is either 65 bytes `r || s || v` or 64 bytes `r || s`, in
/// which case both recovery ids are tried. Malformed input yields
/// `is_valid: false`.
pub fn verify_signature(evm_address_hex: &str, signature_hex: &str, msg_hash_hex: &str) -> SignatureCheck {
    let (Ok(expected), Ok(msg_hash), Ok(sig_bytes)) = (
        Namespace::Evm.normalize_address(evm_address_hex),
        parse_hash(msg_hash_hex),
        hex::decode(strip_hex_prefix(signature_hex)),
    ) else {
        return SignatureCheck::default();
    };

    let candidates: Vec<[u8; 65]> = match sig_bytes.len() {
        65 => <[u8; 65]>::try_from(sig_bytes.as_slice())
            .into_iter()
            .collect(),
        64 => (27u8..=28)
            .map(|v| {
                let mut bytes = [0u8; 65];
                bytes[..64].copy_from_slice(&sig_bytes);
                bytes[64] = v;
                bytes
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut check = SignatureCheck::default();
    for candidate in candidates {
        let Ok(key) = recover_prehash(&msg_hash, &EvmSignature(candidate)) else {
            continue;
        };
        let recovered = hex_encode(evm_address(&key));
        check = SignatureCheck {
            is_valid: recovered == expected,
            public_key: hex_encode(key.to_encoded_point(false).as_bytes()),
            recovered_address: recovered,
        };
        if check.is_valid {
            break;
        }
    }
    check
}

/// Which fields an EVM claimant signs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMessageFormat {
    /// `{evm_address}{amount}`.
    AddressAmount,
    /// `{evm_address}{recipient}{amount}`; the signature cannot be replayed
    /// to pay a different native account.
    #[default]
    AddressRecipientAmount,
}

/// Builds the message an EVM claimant signs.
pub fn claim_message(
    format: ClaimMessageFormat,
    evm_address: &str,
    amount: &str,
    recipient: Option<&str>,
) -> Result<String> {
    let address = Namespace::Evm.normalize_address(evm_address)?;
    validate_amount(amount)?;
    match format {
        ClaimMessageFormat::AddressAmount => Ok(format!("{}{}", address, amount)),
        ClaimMessageFormat::AddressRecipientAmount => {
            let recipient = recipient
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or(AirdropError::MissingRecipient)?;
            let recipient = Namespace::Native.normalize_address(recipient)?;
            Ok(format!("{}{}{}", address, recipient, amount))
        }
    }
}

/// An EVM claim signed by the claimant's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedClaim {
    /// Lower-case hex, no `0x`.
    pub address: String,
    pub claim_amount: String,
    pub message: String,
    pub signature: EvmSignature,
}

impl SignedClaim {
    /// Signs a claim for the address controlled by `signing_key`.
    pub fn sign(
        signing_key: &SigningKey,
        format: ClaimMessageFormat,
        claim_amount: &str,
        recipient: Option<&str>,
    ) -> Result<Self> {
        let address = hex_encode(evm_address(signing_key.verifying_key()));
        let message = claim_message(format, &address, claim_amount, recipient)?;
        let signature = sign_claim(signing_key, &message)?;
        Ok(Self {
            address,
            claim_amount: claim_amount.to_string(),
            message,
            signature,
        })
    }

    pub fn msg_hash(&self) -> Hash {
        hash_message(&self.message)
    }

    pub fn msg_hash_hex(&self) -> String {
        hex_encode(self.msg_hash())
    }

    /// Checks that the message binds this claim and was signed by `address`.
    pub fn verify(&self, format: ClaimMessageFormat, recipient: Option<&str>) -> bool {
        let Ok(expected) = claim_message(format, &self.address, &self.claim_amount, recipient)
        else {
            return false;
        };
        if expected != self.message {
            return false;
        }
        match (
            recover_signer(&self.message, &self.signature),
            Namespace::Evm.normalize_address(&self.address),
        ) {
            (Ok(recovered), Ok(address)) => hex_encode(recovered) == address,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (first Hardhat/Anvil account).
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "f39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_hash_message_known_vector() {
        assert_eq!(
            hex_encode(hash_message("Hello World")),
            "a1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2"
        );
    }

    #[test]
    fn test_evm_address_of_dev_key() {
        let key = signing_key_from_hex(DEV_KEY).unwrap();
        assert_eq!(hex_encode(evm_address(key.verifying_key())), DEV_ADDRESS);
    }

    #[test]
    fn test_signing_key_from_hex_rejects_bad_input() {
        assert!(signing_key_from_hex("").is_err());
        assert!(signing_key_from_hex("0x").is_err());
        assert!(signing_key_from_hex("abcd").is_err());
        assert!(signing_key_from_hex(&"00".repeat(32)).is_err());
        assert!(signing_key_from_hex(&format!("0x{}", DEV_KEY)).is_ok());
    }

    #[test]
    fn test_normalize_recovery_id() {
        assert_eq!(normalize_recovery_id(0), Some(0));
        assert_eq!(normalize_recovery_id(1), Some(1));
        assert_eq!(normalize_recovery_id(27), Some(0));
        assert_eq!(normalize_recovery_id(28), Some(1));
        assert_eq!(normalize_recovery_id(37), Some(0));
        assert_eq!(normalize_recovery_id(38), Some(1));
        assert_eq!(normalize_recovery_id(5), None);
    }

    #[test]
    fn test_sign_and_recover() {
        let key = signing_key_from_hex(DEV_KEY).unwrap();
        let signature = sign_claim(&key, "claim:abc:100").unwrap();
        assert!(signature.v() == 27 || signature.v() == 28);

        let recovered = recover_signer("claim:abc:100", &signature).unwrap();
        assert_eq!(hex_encode(recovered), DEV_ADDRESS);

        let tampered = recover_signer("claim:abc:101", &signature).ok();
        assert_ne!(tampered.map(hex_encode), Some(DEV_ADDRESS.to_string()));
    }

    #[test]
    fn test_signature_hex_round_trip() {
        let key = signing_key_from_hex(DEV_KEY).unwrap();
        let signature = sign_claim(&key, "hello").unwrap();
        let parsed = EvmSignature::from_hex(&format!("0x{}", signature.to_hex())).unwrap();
        assert_eq!(parsed, signature);
        assert!(EvmSignature::from_hex("abcd").is_err());
    }

    #[test]
    fn test_verify_signature_query() {
        let key = signing_key_from_hex(DEV_KEY).unwrap();
        let msg_hash = hash_message("some message");
        let signature = sign_prehash(&key, &msg_hash).unwrap();

        let check = verify_signature(DEV_ADDRESS, &signature.to_hex(), &hex_encode(msg_hash));
        assert!(check.is_valid);
        assert_eq!(check.recovered_address, DEV_ADDRESS);
        assert_eq!(check.public_key.len(), 130);

        // r || s only
        let compact = hex_encode(&signature.as_bytes()[..64]);
        assert!(verify_signature(DEV_ADDRESS, &compact, &hex_encode(msg_hash)).is_valid);

        let other = "0000000000000000000000000000000000000001";
        assert!(!verify_signature(other, &signature.to_hex(), &hex_encode(msg_hash)).is_valid);
        assert!(!verify_signature(DEV_ADDRESS, "zz", &hex_encode(msg_hash)).is_valid);
        assert!(!verify_signature(DEV_ADDRESS, &signature.to_hex(), "12").is_valid);
    }

    #[test]
    fn test_claim_message_formats() {
        let upper = "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266";
        assert_eq!(
            claim_message(ClaimMessageFormat::AddressAmount, upper, "100", None).unwrap(),
            format!("{}100", DEV_ADDRESS)
        );
        assert_eq!(
            claim_message(
                ClaimMessageFormat::AddressRecipientAmount,
                upper,
                "100",
                Some("terra1xyz")
            )
            .unwrap(),
            format!("{}terra1xyz100", DEV_ADDRESS)
        );
        assert!(matches!(
            claim_message(ClaimMessageFormat::AddressRecipientAmount, upper, "100", None),
            Err(AirdropError::MissingRecipient)
        ));
    }

    #[test]
    fn test_signed_claim_binds_recipient() {
        let key = signing_key_from_hex(DEV_KEY).unwrap();
        let claim = SignedClaim::sign(
            &key,
            ClaimMessageFormat::AddressRecipientAmount,
            "500",
            Some("terra1alice"),
        )
        .unwrap();
        assert_eq!(claim.address, DEV_ADDRESS);
        assert!(claim.verify(ClaimMessageFormat::AddressRecipientAmount, Some("terra1alice")));
        assert!(!claim.verify(ClaimMessageFormat::AddressRecipientAmount, Some("terra1mallory")));
        assert!(!claim.verify(ClaimMessageFormat::AddressAmount, None));

        let mut inflated = claim.clone();
        inflated.claim_amount = "5000".into();
        assert!(!inflated.verify(ClaimMessageFormat::AddressRecipientAmount, Some("terra1alice")));
    }
}
