use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::signature::ClaimMessageFormat;
use crate::tree::DuplicatePolicy;

pub const DEFAULT_REGISTRY_PATH: &str = "airdrop_roots.json";

/// Settings shared by every command. Built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirdropConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub claim_message_format: ClaimMessageFormat,
    pub registry_path: PathBuf,
}

impl Default for AirdropConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            claim_message_format: ClaimMessageFormat::default(),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
        }
    }
}

impl AirdropConfig {
    /// Reads the config file at `path`, or returns defaults when no path is given.
    ///
    /// Missing fields fall back to their defaults; a missing file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let content = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Returns a copy using `registry` when one was given on the command line.
    pub fn with_registry(&self, registry: Option<PathBuf>) -> Self {
        Self {
            registry_path: registry.unwrap_or_else(|| self.registry_path.clone()),
            ..self.clone()
        }
    }
}
