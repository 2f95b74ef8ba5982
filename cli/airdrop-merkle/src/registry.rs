//! Append-only log of published airdrop rounds.
//!
//! Each round holds one root per namespace. Claims name the round they were
//! proven against through `root_index`.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::common::{hex_encode, parse_hash, write_file_atomic, Hash};
use crate::error::{AirdropError, Result};
use crate::leaf::Namespace;
use crate::msg::MerkleRootsMsg;

/// One published root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootEntry {
    pub index: u32,
    pub root: Hash,
    pub namespace: Namespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Round {
    native: Hash,
    evm: Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootRegistry {
    rounds: Vec<Round>,
}

impl RootRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a round and returns its index.
    ///
    /// Access control belongs to whoever persists the registry (the contract's
    /// owner check on chain).
    pub fn publish_round(&mut self, native_root: Hash, evm_root: Hash) -> u32 {
        let index = self.rounds.len() as u32;
        self.rounds.push(Round {
            native: native_root,
            evm: evm_root,
        });
        info!(
            index,
            native_root = %hex_encode(native_root),
            evm_root = %hex_encode(evm_root),
            "Published airdrop round"
        );
        index
    }

    /// Returns the root published for `namespace` in round `index`.
    ///
    /// # Errors
    /// Returns [`AirdropError::UnknownRound`] if the round was never published.
    pub fn get_root(&self, index: u32, namespace: Namespace) -> Result<Hash> {
        let round = self
            .rounds
            .get(index as usize)
            .ok_or(AirdropError::UnknownRound {
                index,
                rounds: self.rounds.len(),
            })?;
        Ok(match namespace {
            Namespace::Native => round.native,
            Namespace::Evm => round.evm,
        })
    }

    /// Like [`get_root`](Self::get_root), but also checks the root a client built locally.
    ///
    /// A mismatch means the client's eligibility snapshot is not the one that
    /// was published for that round.
    pub fn resolve(&self, index: u32, namespace: Namespace, expected: &Hash) -> Result<Hash> {
        let published = self.get_root(index, namespace)?;
        if &published != expected {
            return Err(AirdropError::RootMismatch {
                namespace,
                index,
                published: hex_encode(published),
                built: hex_encode(expected),
            });
        }
        Ok(published)
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// All entries, ordered by round then namespace (native first).
    pub fn entries(&self) -> impl Iterator<Item = RootEntry> + '_ {
        self.rounds.iter().enumerate().flat_map(|(i, round)| {
            let index = i as u32;
            [
                RootEntry {
                    index,
                    root: round.native,
                    namespace: Namespace::Native,
                },
                RootEntry {
                    index,
                    root: round.evm,
                    namespace: Namespace::Evm,
                },
            ]
        })
    }

    /// Wire form submitted at contract instantiation or config update.
    pub fn to_msg(&self) -> MerkleRootsMsg {
        MerkleRootsMsg {
            native_merkle_roots: self.rounds.iter().map(|r| hex_encode(r.native)).collect(),
            evm_merkle_roots: self.rounds.iter().map(|r| hex_encode(r.evm)).collect(),
        }
    }

    pub fn from_msg(msg: &MerkleRootsMsg) -> Result<Self> {
        if msg.native_merkle_roots.len() != msg.evm_merkle_roots.len() {
            return Err(AirdropError::UnevenRounds {
                native: msg.native_merkle_roots.len(),
                evm: msg.evm_merkle_roots.len(),
            });
        }
        let rounds = msg
            .native_merkle_roots
            .iter()
            .zip(&msg.evm_merkle_roots)
            .map(|(native, evm)| {
                Ok(Round {
                    native: parse_hash(native)?,
                    evm: parse_hash(evm)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rounds })
    }

    /// Loads a registry file; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No registry at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        debug!("Loading registry from {}", path.display());
        let content = fs::read_to_string(path)?;
        let msg: MerkleRootsMsg = serde_json::from_str(&content)?;
        Self::from_msg(&msg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_msg())?;
        write_file_atomic(path, &content)
    }
}
