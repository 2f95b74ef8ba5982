//! JSON payloads exchanged with the airdrop contract.
//!
//! Hashes, proofs and signatures are lower-case hex without `0x`.

use serde::{Deserialize, Serialize};

use crate::leaf::Namespace;
use crate::signature::SignedClaim;
use crate::tree::Proof;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleRootsMsg {
    pub native_merkle_roots: Vec<String>,
    pub evm_merkle_roots: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    UpdateConfig {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        native_merkle_roots: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evm_merkle_roots: Option<Vec<String>>,
    },
    TerraClaim {
        amount: String,
        merkle_proof: Vec<String>,
        root_index: u32,
    },
    EvmClaim {
        eth_address: String,
        claim_amount: String,
        merkle_proof: Vec<String>,
        root_index: u32,
        signature: String,
        msg_hash: String,
    },
}

impl ExecuteMsg {
    pub fn update_roots(roots: MerkleRootsMsg) -> Self {
        ExecuteMsg::UpdateConfig {
            native_merkle_roots: Some(roots.native_merkle_roots),
            evm_merkle_roots: Some(roots.evm_merkle_roots),
        }
    }

    /// Claim by a native account; the claimant is the transaction sender.
    pub fn terra_claim(amount: &str, proof: &Proof, root_index: u32) -> Self {
        ExecuteMsg::TerraClaim {
            amount: amount.to_string(),
            merkle_proof: proof.to_hex(),
            root_index,
        }
    }

    pub fn evm_claim(claim: &SignedClaim, proof: &Proof, root_index: u32) -> Self {
        ExecuteMsg::EvmClaim {
            eth_address: claim.address.clone(),
            claim_amount: claim.claim_amount.clone(),
            merkle_proof: proof.to_hex(),
            root_index,
            signature: claim.signature.to_hex(),
            msg_hash: claim.msg_hash_hex(),
        }
    }

    /// Namespace a claim message is verified in, `None` for admin messages.
    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            ExecuteMsg::TerraClaim { .. } => Some(Namespace::Native),
            ExecuteMsg::EvmClaim { .. } => Some(Namespace::Evm),
            ExecuteMsg::UpdateConfig { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    IsClaimed {
        address: String,
    },
    IsValidSignature {
        evm_address: String,
        evm_signature: String,
        signed_msg_hash: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClaimResponse {
    pub is_claimed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SignatureResponse {
    pub is_valid: bool,
    pub public_key: String,
    pub recovered_address: String,
}
