//! Chainseed core
//!
//! Synthesizes linked chains of time-stamped records and turns persisted records
//! back into exposition-format metrics:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ Clock Driver │──►│ Chain Builder │──►│ Record Sink  │   (generate)
//! └──────────────┘   └───────────────┘   └──────────────┘
//!
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │ Record Source│──►│ Metric Deriver│──►│ Exposition Writer│   (export)
//! └──────────────┘   └───────────────┘   └──────────────────┘
//! ```
//!
//! A chain is one ingest record, one correlation record referencing it, an
//! optional escalation record, and one execution record timed on an
//! independent clock. The random source is always passed in explicitly so
//! runs can be reproduced from a seed.

pub mod chain;
pub mod clock;
pub mod exposition;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod store;

pub use chain::{generate, ChainBuilder, Generation, GenerationPolicy, GenerationSummary};
pub use clock::{ClockDriver, ClockKind};
pub use exposition::{write_exposition, write_exposition_file};
pub use metrics::{derive_metrics, Metric, MetricSet, HISTOGRAM_BUCKETS};
pub use pipeline::{run_export, run_generation, ExportSummary, PipelineError};
pub use record::{
    Collection, CorrelationRecord, EscalationFlag, EscalationRecord, ExecutionRecord,
    IngestRecord, RecordSet, StageRecord,
};
pub use store::{load_records, persist_records, DocumentStore, StoreError, StoreSession};
