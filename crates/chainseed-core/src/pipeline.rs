//! The two entry-point procedures: generate-and-persist, and load-derive-export.
//!
//! Store failures and exposition I/O failures come back as different variants of
//! [`PipelineError`] so the caller can halt on the former and report the latter.

use crate::chain::{generate, GenerationPolicy, GenerationSummary};
use crate::exposition::write_exposition_file;
use crate::metrics::derive_metrics;
use crate::store::{load_records, persist_records, DocumentStore, StoreError};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to write metrics to {}: {source}", .path.display())]
    Exposition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Store and connectivity failures end the run; exposition failures are reported.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Store(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub records: usize,
    pub samples: usize,
    pub path: PathBuf,
}

pub fn run_generation<S, R>(
    store: &S,
    policy: &GenerationPolicy,
    rng: &mut R,
) -> Result<GenerationSummary, PipelineError>
where
    S: DocumentStore + ?Sized,
    R: Rng + ?Sized,
{
    let start = Instant::now();
    let generation = generate(policy, rng);
    let summary = generation.summary;
    tracing::info!(
        days = summary.days_visited,
        chains = summary.chains_started,
        repetitions = summary.repetitions,
        rolled_over = summary.days_rolled_over,
        records = generation.records.total(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generated record chains"
    );

    let start = Instant::now();
    persist_records(store, &generation.records)?;
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "persisted records"
    );
    Ok(summary)
}

pub fn run_export<S>(store: &S, out: &Path) -> Result<ExportSummary, PipelineError>
where
    S: DocumentStore + ?Sized,
{
    let records = load_records(store)?;
    let metrics = derive_metrics(&records);

    let samples = write_exposition_file(out, &metrics).map_err(|source| {
        PipelineError::Exposition {
            path: out.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(path = %out.display(), samples, "wrote metrics exposition");

    Ok(ExportSummary {
        records: records.total(),
        samples,
        path: out.to_path_buf(),
    })
}
