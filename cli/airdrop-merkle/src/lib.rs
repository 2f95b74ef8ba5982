//! Merkle eligibility trees, inclusion proofs and EVM claim signatures for
//! airdrops paying out to native-chain and EVM accounts.

#![forbid(unsafe_code)]

pub mod common;
pub mod config;
pub mod error;
pub mod leaf;
pub mod msg;
pub mod records;
pub mod registry;
pub mod signature;
pub mod tree;

pub use common::{hash_sorted_pair, hex_encode, keccak256, parse_hash, write_file_atomic, Hash};
pub use config::AirdropConfig;
pub use error::{AirdropError, Result};
pub use leaf::{encode_leaf, EligibilityRecord, Leaf, Namespace};
pub use registry::{RootEntry, RootRegistry};
pub use signature::{
    hash_message, recover_signer, sign_claim, verify_signature, ClaimMessageFormat, EvmSignature,
    SignedClaim,
};
pub use tree::{verify, verify_hex, DuplicatePolicy, MerkleTree, Proof};
