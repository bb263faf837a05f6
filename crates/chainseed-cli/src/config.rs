//! CLI configuration file (`--config <file.json>`).

use anyhow::{Context, Result};
use chainseed_storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainseedConfig {
    pub store: StoreConfig,
}

/// Reads `path` when given; otherwise every value takes its default.
pub fn load(path: Option<&Path>) -> Result<ChainseedConfig> {
    let Some(path) = path else {
        return Ok(ChainseedConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}
