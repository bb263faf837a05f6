//! Chain builder: drives a whole generation run.
//!
//! For every day between the ingest clock's start and the policy end date, up
//! to `records_per_day` chains are emitted, each as `repetitions_per_chain`
//! record quadruples. All draws (chain tokens, delays, durations) come from the
//! generator handed to [`generate`], so a seeded generator reproduces a run.
//!
//! Day boundary: once the ingest clock passes 23:59:59 of the current day it is
//! snapped to the next midnight and the rest of that day's chain budget is
//! dropped.

use crate::clock::{ClockDriver, ClockKind};
use crate::record::{
    CorrelationRecord, EscalationFlag, EscalationRecord, ExecutionRecord, IngestRecord, RecordSet,
    CORRELATION_APPLICATION_ID, CORRELATION_APPLICATION_NAME, ESCALATION_APPLICATION_ID,
    ESCALATION_APPLICATION_NAME, INGEST_APPLICATION_ID, INGEST_APPLICATION_NAME,
};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use rand::Rng;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPolicy {
    pub end_date: DateTime<Utc>,
    pub days: u32,
    pub records_per_day: usize,
    pub repetitions_per_chain: usize,
    /// Chains whose index is a multiple of this are not escalated.
    pub escalation_modulus: usize,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            end_date: Utc
                .with_ymd_and_hms(2024, 10, 25, 12, 0, 0)
                .single()
                .unwrap_or_default(),
            days: 1,
            records_per_day: 400_000,
            repetitions_per_chain: 2,
            escalation_modulus: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub days_visited: usize,
    pub chains_started: usize,
    pub repetitions: usize,
    /// Days whose chain budget was cut short by the midnight roll-over.
    pub days_rolled_over: usize,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub records: RecordSet,
    pub summary: GenerationSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayOutcome {
    BudgetSpent,
    RolledOver,
}

pub struct ChainBuilder<'r, R: Rng + ?Sized> {
    policy: GenerationPolicy,
    clocks: ClockDriver,
    rng: &'r mut R,
    records: RecordSet,
    summary: GenerationSummary,
}

impl<'r, R: Rng + ?Sized> ChainBuilder<'r, R> {
    pub fn new(policy: GenerationPolicy, rng: &'r mut R) -> Self {
        let clocks = ClockDriver::seeded(policy.end_date, policy.days);
        Self {
            policy,
            clocks,
            rng,
            records: RecordSet::default(),
            summary: GenerationSummary::default(),
        }
    }

    pub fn clocks(&self) -> &ClockDriver {
        &self.clocks
    }

    pub fn run(mut self) -> Generation {
        let mut day = self.clocks.now(ClockKind::Ingest);
        while day < self.policy.end_date {
            self.summary.days_visited += 1;
            if self.run_day(end_of_day(day)) == DayOutcome::RolledOver {
                self.summary.days_rolled_over += 1;
            }
            day = day + Duration::days(1);
        }

        Generation {
            records: self.records,
            summary: self.summary,
        }
    }

    fn run_day(&mut self, end_of_day: DateTime<Utc>) -> DayOutcome {
        for index in 0..self.policy.records_per_day {
            // One flag per chain; every repetition of the chain shares it.
            let flag = EscalationFlag::for_chain_index(index, self.policy.escalation_modulus);
            self.summary.chains_started += 1;

            for _ in 0..self.policy.repetitions_per_chain {
                self.build_repetition(flag);
                if self.roll_over_if_past(end_of_day) {
                    return DayOutcome::RolledOver;
                }
            }
        }
        DayOutcome::BudgetSpent
    }

    /// Snaps the ingest clock forward to the next midnight once it is past
    /// `end_of_day`. A clock already past midnight is left where it is so the
    /// ingest timeline never runs backwards.
    fn roll_over_if_past(&mut self, end_of_day: DateTime<Utc>) -> bool {
        let now = self.clocks.now(ClockKind::Ingest);
        if now <= end_of_day {
            return false;
        }
        let midnight = end_of_day + Duration::seconds(1);
        let rolled_to = now.max(midnight);
        tracing::debug!(
            %rolled_to,
            chains = self.summary.chains_started,
            "ingest clock crossed day end"
        );
        self.clocks.set(ClockKind::Ingest, rolled_to);
        true
    }

    fn build_repetition(&mut self, flag: EscalationFlag) {
        let token = self.chain_token();
        let at = self.clocks.advance(ClockKind::Ingest, &mut *self.rng);
        let exec_at = self.clocks.advance(ClockKind::Execution, &mut *self.rng);
        let duration: u32 = self.rng.random_range(1..=60);

        let mut ingest = IngestRecord {
            id: format!("ingest_{token}"),
            tracking_id: format!("ingest_tracking_{token}"),
            application_id: INGEST_APPLICATION_ID.to_string(),
            application_name: INGEST_APPLICATION_NAME.to_string(),
            created_at: at,
            updated_at: at,
            correlation_ref: Vec::with_capacity(1),
        };

        let mut correlation = CorrelationRecord {
            id: format!("correlation_{token}"),
            tracking_id: format!("correlation_tracking_{token}"),
            application_id: CORRELATION_APPLICATION_ID.to_string(),
            application_name: CORRELATION_APPLICATION_NAME.to_string(),
            created_at: at,
            updated_at: at,
            should_escalate: flag,
            ingest_ref: vec![ingest.id.clone()],
            escalation_ref: Vec::new(),
        };

        let execution = ExecutionRecord {
            id: format!("exec_{token}"),
            tracking_id: ingest.tracking_id.clone(),
            application_id: ingest.application_id.clone(),
            application_name: ingest.application_name.clone(),
            created_at: exec_at,
            duration,
            reference_id: ingest.id.clone(),
        };

        if flag.is_yes() {
            let escalation = EscalationRecord {
                id: format!("escalation_{token}"),
                tracking_id: format!("escalation_tracking_{token}"),
                application_id: ESCALATION_APPLICATION_ID.to_string(),
                application_name: ESCALATION_APPLICATION_NAME.to_string(),
                created_at: at,
                updated_at: at,
                correlation_ref: vec![correlation.id.clone()],
            };
            correlation.escalation_ref.push(escalation.id.clone());
            self.records.escalation.push(escalation);
        }

        ingest.correlation_ref.push(correlation.id.clone());

        self.records.ingest.push(ingest);
        self.records.correlation.push(correlation);
        self.records.executions.push(execution);
        self.summary.repetitions += 1;
    }

    fn chain_token(&mut self) -> Uuid {
        let bytes: [u8; 16] = self.rng.random();
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// Runs one full generation pass with the given policy and generator.
pub fn generate<R: Rng + ?Sized>(policy: &GenerationPolicy, rng: &mut R) -> Generation {
    ChainBuilder::new(policy.clone(), rng).run()
}

/// 23:59:59 on the calendar day of `at`.
pub fn end_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = at.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::days(1) - Duration::seconds(1)
}
