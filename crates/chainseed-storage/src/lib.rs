//! Chainseed storage collaborators
//!
//! - [`JsonDirStore`]: one JSON array file per collection under
//!   `<root>/<database>/`, written through a temp file and renamed into place.
//! - [`MemoryStore`]: in-process store for tests and dry runs.
//! - [`cache`]: the key/value cache collaborator (`get`/`set`/`close`, no TTL).
//!
//! All of them implement the contracts defined in `chainseed-core`.

pub mod cache;
pub mod json_dir;
pub mod memory;

pub use cache::{CacheError, FileCache, KeyValueCache, MemoryCache};
pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Configuration
// ============================================================================

/// Where the document store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one sub-directory per database
    pub root: PathBuf,
    /// Database name
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            database: "monitoring_demo".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn database_dir(&self) -> PathBuf {
        self.root.join(&self.database)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file backing the cache
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/cache.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"database": "other"}"#).unwrap();
        assert_eq!(config.database, "other");
        assert_eq!(config.root, PathBuf::from("./data"));
        assert_eq!(config.database_dir(), PathBuf::from("./data/other"));
    }
}
