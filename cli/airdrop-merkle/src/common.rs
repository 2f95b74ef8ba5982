use std::fs::File;
use std::io::Write;
use std::path::Path;

use sha3::{Digest, Keccak256};

use crate::error::{AirdropError, Result};

/// 32-byte node of a Merkle tree.
pub type Hash = [u8; 32];

/// Computes the Keccak256 hash of arbitrary bytes.
pub fn keccak256(bytes: impl AsRef<[u8]>) -> Hash {
    Keccak256::digest(bytes.as_ref()).into()
}

/// Hashes two nodes after ordering them by byte value.
///
/// Ordering the pair makes a proof verifiable without recording whether each
/// sibling sat on the left or the right.
pub fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into()
}

/// Strips an optional `0x`/`0X` prefix and surrounding whitespace.
pub fn strip_hex_prefix(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Parses a 32-byte hash from hex, with or without `0x` prefix.
///
/// # Errors
/// Returns [`AirdropError::InvalidHex`] if the string is not 64 hex characters.
pub fn parse_hash(s: &str) -> Result<Hash> {
    let cleaned = strip_hex_prefix(s);
    if cleaned.len() != 64 {
        return Err(AirdropError::InvalidHex(format!(
            "expected 64 hex chars, got {}",
            cleaned.len()
        )));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| AirdropError::InvalidHex(e.to_string()))?;
    Ok(hash)
}

/// Lower-case hex without prefix, the encoding used on the wire.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Writes `contents` to a sibling temp file, then renames it over `path`.
pub fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
