//! Loading eligibility snapshots from disk.
//!
//! Two formats are accepted: a JSON array of `{"address", "amount"}` objects
//! (`.json` extension) or one `address,amount` pair per line. Blank lines and
//! lines starting with `#` are skipped, as is an `address,amount` header.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{AirdropError, Result};
use crate::leaf::{EligibilityRecord, Namespace};

pub fn load_records(path: &Path) -> Result<Vec<EligibilityRecord>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let records = if is_json {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))?
    } else {
        parse_lines(BufReader::new(File::open(path)?))?
    };
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn parse_lines(reader: impl BufRead) -> Result<Vec<EligibilityRecord>> {
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if line_num == 0 && trimmed.eq_ignore_ascii_case("address,amount") {
            continue;
        }

        let mut parts = trimmed.split(',').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(address), Some(amount), None) if !address.is_empty() && !amount.is_empty() => {
                records.push(EligibilityRecord::new(address, amount));
            }
            _ => {
                return Err(AirdropError::InvalidRecord {
                    line: line_num + 1,
                    reason: format!("expected 'address,amount', got '{}'", trimmed),
                })
            }
        }

        if records.len() % 1_000_000 == 0 {
            debug!("Parsed {} records...", records.len());
        }
    }

    Ok(records)
}

/// Guesses the namespace of an address: 40 hex characters (optionally
/// `0x`-prefixed) are EVM, everything else is native.
pub fn detect_namespace(address: &str) -> Namespace {
    match Namespace::Evm.normalize_address(address) {
        Ok(_) => Namespace::Evm,
        Err(_) => Namespace::Native,
    }
}

/// Splits a mixed snapshot into `(native, evm)` records.
pub fn partition(
    records: Vec<EligibilityRecord>,
) -> (Vec<EligibilityRecord>, Vec<EligibilityRecord>) {
    records
        .into_iter()
        .partition(|record| detect_namespace(&record.address) == Namespace::Native)
}

/// Groups records by the namespace their tree is built in.
///
/// With an explicit `namespace` every record belongs to it; otherwise the
/// snapshot is partitioned by address format. Empty groups are dropped.
pub fn group_by_namespace(
    records: Vec<EligibilityRecord>,
    namespace: Option<Namespace>,
) -> Vec<(Namespace, Vec<EligibilityRecord>)> {
    let groups = match namespace {
        Some(namespace) => vec![(namespace, records)],
        None => {
            let (native, evm) = partition(records);
            vec![(Namespace::Native, native), (Namespace::Evm, evm)]
        }
    };
    groups
        .into_iter()
        .filter(|(_, records)| !records.is_empty())
        .collect()
}
