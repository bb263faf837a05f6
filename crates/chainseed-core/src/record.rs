//! Record kinds produced by the chain builder and read back by the metric deriver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const INGEST_APPLICATION_ID: &str = "ingest_application";
pub const INGEST_APPLICATION_NAME: &str = "ingest_application_name";
pub const CORRELATION_APPLICATION_ID: &str = "correlation_application";
pub const CORRELATION_APPLICATION_NAME: &str = "correlation_application_name";
pub const ESCALATION_APPLICATION_ID: &str = "escalation_application";
pub const ESCALATION_APPLICATION_NAME: &str = "escalation_application_name";

/// The four persisted collections, in the order pipelines visit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Ingest,
    Correlation,
    Escalation,
    UseCases,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Ingest,
        Collection::Correlation,
        Collection::Escalation,
        Collection::UseCases,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Ingest => "ingest",
            Collection::Correlation => "correlation",
            Collection::Escalation => "escalation",
            Collection::UseCases => "use_cases",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a correlation record spawns an escalation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationFlag {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl EscalationFlag {
    /// Every chain whose index is a multiple of `modulus` is not escalated.
    pub fn for_chain_index(index: usize, modulus: usize) -> Self {
        if modulus == 0 || index % modulus != 0 {
            EscalationFlag::Yes
        } else {
            EscalationFlag::No
        }
    }

    pub fn is_yes(self) -> bool {
        matches!(self, EscalationFlag::Yes)
    }
}

/// First stage: a record entering the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub tracking_id: String,
    pub application_id: String,
    pub application_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Correlation records produced from this record (zero or one).
    pub correlation_ref: Vec<String>,
}

/// Second stage: correlates an ingest record and decides on escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub tracking_id: String,
    pub application_id: String,
    pub application_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub should_escalate: EscalationFlag,
    /// The ingest record(s) this record was created from.
    pub ingest_ref: Vec<String>,
    /// Escalation records spawned by this record (zero or one).
    pub escalation_ref: Vec<String>,
}

/// Optional third stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub tracking_id: String,
    pub application_id: String,
    pub application_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub correlation_ref: Vec<String>,
}

/// A measured task run. Write-once, so there is no `updatedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    /// Tracking id of the originating ingest record.
    pub tracking_id: String,
    pub application_id: String,
    pub application_name: String,
    pub created_at: DateTime<Utc>,
    /// Run duration in seconds.
    pub duration: u32,
    /// Id of the originating ingest record.
    pub reference_id: String,
}

/// Accessors shared by every record kind.
pub trait StageRecord {
    fn id(&self) -> &str;
    fn application_name(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_stage_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StageRecord for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn application_name(&self) -> &str {
                    &self.application_name
                }

                fn created_at(&self) -> DateTime<Utc> {
                    self.created_at
                }
            }
        )*
    };
}

impl_stage_record!(IngestRecord, CorrelationRecord, EscalationRecord, ExecutionRecord);

/// All four collections held in memory, each in generation (or source) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub ingest: Vec<IngestRecord>,
    pub correlation: Vec<CorrelationRecord>,
    pub escalation: Vec<EscalationRecord>,
    pub executions: Vec<ExecutionRecord>,
}

impl RecordSet {
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Ingest => self.ingest.len(),
            Collection::Correlation => self.correlation.len(),
            Collection::Escalation => self.escalation.len(),
            Collection::UseCases => self.executions.len(),
        }
    }

    pub fn total(&self) -> usize {
        Collection::ALL.iter().map(|c| self.len(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escalation_flag_is_no_on_multiples_of_modulus() {
        assert_eq!(EscalationFlag::for_chain_index(0, 3), EscalationFlag::No);
        assert_eq!(EscalationFlag::for_chain_index(1, 3), EscalationFlag::Yes);
        assert_eq!(EscalationFlag::for_chain_index(2, 3), EscalationFlag::Yes);
        assert_eq!(EscalationFlag::for_chain_index(3, 3), EscalationFlag::No);
    }

    #[test]
    fn records_use_document_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 10, 24, 12, 0, 1).unwrap();
        let record = CorrelationRecord {
            id: "correlation_x".to_string(),
            tracking_id: "correlation_tracking_x".to_string(),
            application_id: CORRELATION_APPLICATION_ID.to_string(),
            application_name: CORRELATION_APPLICATION_NAME.to_string(),
            created_at: at,
            updated_at: at,
            should_escalate: EscalationFlag::Yes,
            ingest_ref: vec!["ingest_x".to_string()],
            escalation_ref: Vec::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], "correlation_x");
        assert_eq!(value["shouldEscalate"], "YES");
        assert_eq!(value["ingestRef"][0], "ingest_x");
        assert_eq!(value["applicationName"], CORRELATION_APPLICATION_NAME);
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn execution_record_has_no_updated_at() {
        let at = Utc.with_ymd_and_hms(2024, 10, 23, 12, 0, 1).unwrap();
        let record = ExecutionRecord {
            id: "exec_x".to_string(),
            tracking_id: "ingest_tracking_x".to_string(),
            application_id: INGEST_APPLICATION_ID.to_string(),
            application_name: INGEST_APPLICATION_NAME.to_string(),
            created_at: at,
            duration: 7,
            reference_id: "ingest_x".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("updatedAt").is_none());
        assert_eq!(value["duration"], 7);
        assert_eq!(value["referenceId"], "ingest_x");
    }

    #[test]
    fn collection_names_are_stable() {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ingest", "correlation", "escalation", "use_cases"]);
    }
}
