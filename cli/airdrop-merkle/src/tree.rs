use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::{hash_sorted_pair, hex_encode, parse_hash, Hash};
use crate::error::{AirdropError, Result};
use crate::leaf::{EligibilityRecord, Leaf, Namespace};

/// What to do when two input records encode to the same leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Collapse identical leaves into one.
    #[default]
    Dedupe,
    /// Fail the build with [`AirdropError::DuplicateRecord`].
    Reject,
}

/// Sibling hashes from the leaf level up to (excluding) the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proof(Vec<Hash>);

impl Proof {
    pub fn new(siblings: Vec<Hash>) -> Self {
        Self(siblings)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn siblings(&self) -> &[Hash] {
        &self.0
    }

    /// Hex strings without `0x`, as submitted in `merkle_proof`.
    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(hex_encode).collect()
    }

    pub fn from_hex<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        items
            .iter()
            .map(|s| parse_hash(s.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

/// Merkle tree over the sorted leaf set of one namespace.
///
/// Parents hash their children in byte order. A level with an odd node count
/// promotes its last node to the next level unchanged.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    namespace: Namespace,
    levels: Vec<Vec<Hash>>,
    root: Hash,
}

impl MerkleTree {
    /// Builds a tree from a snapshot of eligibility records.
    ///
    /// The root does not depend on the order of `records`.
    pub fn build(
        namespace: Namespace,
        records: &[EligibilityRecord],
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(AirdropError::EmptyTree);
        }

        let mut encoded = records
            .iter()
            .map(|record| namespace.encode(record).map(|leaf| (leaf, record)))
            .collect::<Result<Vec<_>>>()?;
        encoded.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut leaves: Vec<Leaf> = Vec::with_capacity(encoded.len());
        let mut duplicates = 0usize;
        for (leaf, record) in encoded {
            if leaves.last() == Some(&leaf) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(AirdropError::DuplicateRecord {
                            address: record.address.clone(),
                            amount: record.amount.clone(),
                        })
                    }
                    DuplicatePolicy::Dedupe => {
                        duplicates += 1;
                        continue;
                    }
                }
            }
            leaves.push(leaf);
        }
        if duplicates > 0 {
            warn!(%namespace, duplicates, "Collapsed duplicate eligibility records");
        }

        let levels = build_levels(leaves);
        let root = levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .ok_or(AirdropError::EmptyTree)?;

        debug!(
            %namespace,
            leaves = levels[0].len(),
            depth = levels.len() - 1,
            root = %hex_encode(root),
            "Built Merkle tree"
        );

        Ok(Self {
            namespace,
            levels,
            root,
        })
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn root_hex(&self) -> String {
        hex_encode(self.root)
    }

    /// Sorted, deduplicated leaves.
    pub fn leaves(&self) -> &[Leaf] {
        &self.levels[0]
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn contains(&self, record: &EligibilityRecord) -> bool {
        self.namespace
            .encode(record)
            .map(|leaf| self.leaves().binary_search(&leaf).is_ok())
            .unwrap_or(false)
    }

    /// Generates the inclusion proof for `record`.
    ///
    /// # Errors
    /// Returns [`AirdropError::LeafNotFound`] if the record is not in the tree,
    /// or a validation error if it cannot be encoded.
    pub fn proof(&self, record: &EligibilityRecord) -> Result<Proof> {
        let leaf = self.namespace.encode(record)?;
        let index =
            self.leaves()
                .binary_search(&leaf)
                .map_err(|_| AirdropError::LeafNotFound {
                    namespace: self.namespace,
                    address: record.address.clone(),
                    amount: record.amount.clone(),
                })?;
        Ok(self.proof_at(index))
    }

    fn proof_at(&self, leaf_index: usize) -> Proof {
        let mut siblings = Vec::with_capacity(self.depth());
        let mut index = leaf_index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = index ^ 1;
            // Promoted nodes have no sibling at this level.
            if sibling_index < level.len() {
                siblings.push(level[sibling_index]);
            }
            index /= 2;
        }

        Proof(siblings)
    }
}

fn build_levels(leaves: Vec<Leaf>) -> Vec<Vec<Hash>> {
    let mut levels = Vec::new();
    let mut level = leaves;

    while level.len() > 1 {
        let next_level: Vec<Hash> = level
            .chunks(2)
            .map(|chunk| {
                if chunk.len() == 2 {
                    hash_sorted_pair(&chunk[0], &chunk[1])
                } else {
                    chunk[0]
                }
            })
            .collect();
        levels.push(std::mem::replace(&mut level, next_level));
    }
    levels.push(level);

    levels
}

/// Folds `proof` onto `leaf` and compares the result with `root`.
pub fn verify_leaf(proof: &Proof, leaf: &Leaf, root: &Hash) -> bool {
    let computed = proof
        .siblings()
        .iter()
        .fold(*leaf, |acc, sibling| hash_sorted_pair(&acc, sibling));
    &computed == root
}

/// Checks that `record` is a member of the tree whose root is `root`.
///
/// Never fails: a record that cannot be encoded simply does not verify.
pub fn verify(namespace: Namespace, proof: &Proof, record: &EligibilityRecord, root: &Hash) -> bool {
    match namespace.encode(record) {
        Ok(leaf) => verify_leaf(proof, &leaf, root),
        Err(_) => false,
    }
}

/// String form of [`verify`], taking the hex values a claim message carries.
pub fn verify_hex(
    namespace: Namespace,
    address: &str,
    amount: &str,
    merkle_proof: &[String],
    merkle_root: &str,
) -> bool {
    let (Ok(proof), Ok(root)) = (Proof::from_hex(merkle_proof), parse_hash(merkle_root)) else {
        return false;
    };
    verify(
        namespace,
        &proof,
        &EligibilityRecord::new(address, amount),
        &root,
    )
}
