//! Key/value cache collaborator.
//!
//! Plain string keys and values, no TTL, no richer data structures. Neither
//! pipeline uses it; it rounds out the external surface.

use crate::CacheConfig;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to connect to cache at {target}: {reason}")]
    Connect { target: String, reason: String },
    #[error("cache key not found: {0}")]
    Missing(String),
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache file is not a JSON object: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("cache is closed")]
    Closed,
}

pub trait KeyValueCache {
    fn ping(&self) -> Result<(), CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn get(&self, key: &str) -> Result<String, CacheError>;
    fn close(&self) -> Result<(), CacheError>;
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<BTreeMap<String, String>>,
    closed: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueCache for MemoryCache {
    fn ping(&self) -> Result<(), CacheError> {
        ensure_open(&self.closed)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        ensure_open(&self.closed)?;
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String, CacheError> {
        ensure_open(&self.closed)?;
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::Missing(key.to_string()))
    }

    fn close(&self) -> Result<(), CacheError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

// ============================================================================
// File-backed
// ============================================================================

/// Cache persisted as one JSON object; every `set` writes through.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    closed: AtomicBool,
}

impl FileCache {
    /// Loads the cache file (or starts empty) and pings it.
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let path = config.path.clone();
        let connect_err = |reason: String| CacheError::Connect {
            target: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| connect_err(e.to_string()))?;
        }
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| connect_err(e.to_string()))?;
            serde_json::from_str(&contents).map_err(|e| connect_err(e.to_string()))?
        } else {
            BTreeMap::new()
        };

        let cache = Self {
            path,
            entries: RwLock::new(entries),
            closed: AtomicBool::new(false),
        };
        cache.ping()?;
        tracing::info!(path = %cache.path.display(), "connected to cache");
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueCache for FileCache {
    fn ping(&self) -> Result<(), CacheError> {
        ensure_open(&self.closed)?;
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                Err(CacheError::Connect {
                    target: self.path.display().to_string(),
                    reason: "cache directory is missing".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        ensure_open(&self.closed)?;
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn get(&self, key: &str) -> Result<String, CacheError> {
        ensure_open(&self.closed)?;
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::Missing(key.to_string()))
    }

    fn close(&self) -> Result<(), CacheError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let entries = self.entries.read();
        self.persist(&entries)
    }
}

fn ensure_open(closed: &AtomicBool) -> Result<(), CacheError> {
    if closed.load(Ordering::Acquire) {
        Err(CacheError::Closed)
    } else {
        Ok(())
    }
}
