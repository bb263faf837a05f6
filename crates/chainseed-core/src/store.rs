//! Document-store contract and the typed record sink/source built on it.
//!
//! Concrete stores live in `chainseed-storage`; this module only depends on the
//! trait so the pipelines can be tested against any backend.

use crate::record::{Collection, RecordSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to document store at {target}: {reason}")]
    Connect { target: String, reason: String },
    #[error("document store I/O error on `{collection}`: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode `{collection}` documents: {source}")]
    Codec {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document store is closed")]
    Closed,
}

/// Minimal collection-oriented document store.
pub trait DocumentStore {
    /// Verifies the store is reachable.
    fn ping(&self) -> Result<(), StoreError>;

    /// Removes every document from `collection`. Returns how many were removed.
    fn delete_all(&self, collection: Collection) -> Result<usize, StoreError>;

    /// Appends `docs` to `collection`, preserving their order.
    fn insert_many(&self, collection: Collection, docs: Vec<Value>) -> Result<usize, StoreError>;

    /// Every document in `collection`. Callers must not rely on the order.
    fn find_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Releases the connection. Later calls fail with [`StoreError::Closed`].
    fn close(&self) -> Result<(), StoreError>;
}

fn encode<T: Serialize>(collection: Collection, records: &[T]) -> Result<Vec<Value>, StoreError> {
    records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|source| StoreError::Codec {
            collection: collection.name().to_string(),
            source,
        })
}

fn decode<T: DeserializeOwned>(collection: Collection, docs: Vec<Value>) -> Result<Vec<T>, StoreError> {
    docs.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|source| StoreError::Codec {
            collection: collection.name().to_string(),
            source,
        })
}

fn replace_collection<S, T>(store: &S, collection: Collection, records: &[T]) -> Result<(), StoreError>
where
    S: DocumentStore + ?Sized,
    T: Serialize,
{
    let docs = encode(collection, records)?;
    let removed = store.delete_all(collection)?;
    let inserted = store.insert_many(collection, docs)?;
    tracing::info!(%collection, removed, inserted, "replaced collection");
    Ok(())
}

/// Replaces each collection's contents with `records`, one collection after another.
pub fn persist_records<S: DocumentStore + ?Sized>(store: &S, records: &RecordSet) -> Result<(), StoreError> {
    replace_collection(store, Collection::Ingest, &records.ingest)?;
    replace_collection(store, Collection::Correlation, &records.correlation)?;
    replace_collection(store, Collection::Escalation, &records.escalation)?;
    replace_collection(store, Collection::UseCases, &records.executions)?;
    Ok(())
}

/// Reads all four collections back.
pub fn load_records<S: DocumentStore + ?Sized>(store: &S) -> Result<RecordSet, StoreError> {
    let records = RecordSet {
        ingest: decode(Collection::Ingest, store.find_all(Collection::Ingest)?)?,
        correlation: decode(Collection::Correlation, store.find_all(Collection::Correlation)?)?,
        escalation: decode(Collection::Escalation, store.find_all(Collection::Escalation)?)?,
        executions: decode(Collection::UseCases, store.find_all(Collection::UseCases)?)?,
    };
    tracing::info!(
        ingest = records.ingest.len(),
        correlation = records.correlation.len(),
        escalation = records.escalation.len(),
        use_cases = records.executions.len(),
        "loaded records"
    );
    Ok(records)
}

/// Owns a store for one pipeline invocation and closes it when dropped.
pub struct StoreSession<S: DocumentStore> {
    store: Option<S>,
}

impl<S: DocumentStore> StoreSession<S> {
    pub fn new(store: S) -> Self {
        Self { store: Some(store) }
    }

    pub fn store(&self) -> Result<&S, StoreError> {
        self.store.as_ref().ok_or(StoreError::Closed)
    }

    /// Closes now and reports the outcome instead of logging it on drop.
    pub fn close(mut self) -> Result<(), StoreError> {
        match self.store.take() {
            Some(store) => store.close(),
            None => Ok(()),
        }
    }
}

impl<S: DocumentStore> Drop for StoreSession<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            if let Err(err) = store.close() {
                tracing::warn!(error = %err, "failed to close document store");
            }
        }
    }
}
