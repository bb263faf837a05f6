//! Directory-backed document store.
//!
//! Layout:
//!
//! ```text
//! <root>/<database>/
//!   ingest.json
//!   correlation.json
//!   escalation.json
//!   use_cases.json
//! ```
//!
//! Each file is a JSON array. A missing file reads as an empty collection.

use crate::StoreConfig;
use chainseed_core::{Collection, DocumentStore, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl JsonDirStore {
    /// Creates the database directory if needed and pings it.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let dir = config.database_dir();
        fs::create_dir_all(&dir).map_err(|err| StoreError::Connect {
            target: dir.display().to_string(),
            reason: err.to_string(),
        })?;

        let store = Self {
            dir,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        };
        store.ping()?;
        tracing::info!(dir = %store.dir.display(), "connected to document store");
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn io_error(collection: Collection, source: std::io::Error) -> StoreError {
        StoreError::Io {
            collection: collection.name().to_string(),
            source,
        }
    }

    fn read_collection(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(collection);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::io_error(collection, err)),
        };
        serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Codec {
            collection: collection.name().to_string(),
            source,
        })
    }

    /// Writes `docs` to a sibling temp file, then renames it over the collection file.
    fn write_collection(&self, collection: Collection, docs: &[Value]) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");

        let file = fs::File::create(&tmp).map_err(|err| Self::io_error(collection, err))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, docs).map_err(|source| StoreError::Codec {
            collection: collection.name().to_string(),
            source,
        })?;
        out.flush().map_err(|err| Self::io_error(collection, err))?;
        drop(out);

        fs::rename(&tmp, &path).map_err(|err| Self::io_error(collection, err))
    }
}

impl DocumentStore for JsonDirStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(StoreError::Connect {
                target: self.dir.display().to_string(),
                reason: "database directory is missing".to_string(),
            })
        }
    }

    fn delete_all(&self, collection: Collection) -> Result<usize, StoreError> {
        self.ensure_open()?;
        let _guard = self.write_lock.lock();
        let removed = self.read_collection(collection)?.len();
        self.write_collection(collection, &[])?;
        Ok(removed)
    }

    fn insert_many(&self, collection: Collection, docs: Vec<Value>) -> Result<usize, StoreError> {
        self.ensure_open()?;
        let _guard = self.write_lock.lock();
        let inserted = docs.len();
        let mut all = self.read_collection(collection)?;
        all.extend(docs);
        self.write_collection(collection, &all)?;
        Ok(inserted)
    }

    fn find_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.ensure_open()?;
        self.read_collection(collection)
    }

    fn close(&self) -> Result<(), StoreError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(dir = %self.dir.display(), "closed document store");
        }
        Ok(())
    }
}
