//! Property tests for generated record chains and the metrics derived from them.

use chainseed_core::chain::end_of_day;
use chainseed_core::clock::max_delay;
use chainseed_core::{derive_metrics, generate, EscalationFlag, GenerationPolicy, RecordSet};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn run(policy: &GenerationPolicy, seed: u64) -> (RecordSet, chainseed_core::GenerationSummary) {
    let out = generate(policy, &mut StdRng::seed_from_u64(seed));
    (out.records, out.summary)
}

/// Policies small enough to run many cases, with end dates spread across the
/// day so some runs start close to midnight.
fn policy_strategy() -> impl Strategy<Value = GenerationPolicy> {
    (0i64..86_400, 1u32..=3, 0usize..40).prop_map(|(offset, days, records_per_day)| {
        let base = Utc.with_ymd_and_hms(2024, 10, 25, 0, 0, 0).unwrap();
        GenerationPolicy {
            end_date: base + Duration::seconds(offset),
            days,
            records_per_day,
            ..GenerationPolicy::default()
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ingest_and_correlation_reference_each_other(policy in policy_strategy(), seed in any::<u64>()) {
        let (records, _) = run(&policy, seed);
        let ingest_by_id: HashMap<&str, _> =
            records.ingest.iter().map(|r| (r.id.as_str(), r)).collect();

        prop_assert_eq!(records.ingest.len(), records.correlation.len());
        for corr in &records.correlation {
            prop_assert_eq!(corr.ingest_ref.len(), 1);
            let ingest = ingest_by_id.get(corr.ingest_ref[0].as_str());
            prop_assert!(ingest.is_some());
            prop_assert_eq!(&ingest.unwrap().correlation_ref, &vec![corr.id.clone()]);
        }
    }

    #[test]
    fn prop_escalation_exists_iff_flagged(policy in policy_strategy(), seed in any::<u64>()) {
        let (records, _) = run(&policy, seed);
        let mut escalations_by_corr: HashMap<&str, Vec<&str>> = HashMap::new();
        for esc in &records.escalation {
            prop_assert_eq!(esc.correlation_ref.len(), 1);
            escalations_by_corr
                .entry(esc.correlation_ref[0].as_str())
                .or_default()
                .push(esc.id.as_str());
        }

        for corr in &records.correlation {
            let spawned = escalations_by_corr.get(corr.id.as_str()).cloned().unwrap_or_default();
            match corr.should_escalate {
                EscalationFlag::Yes => {
                    prop_assert_eq!(spawned.len(), 1);
                    prop_assert_eq!(&corr.escalation_ref, &vec![spawned[0].to_string()]);
                }
                EscalationFlag::No => {
                    prop_assert!(spawned.is_empty());
                    prop_assert!(corr.escalation_ref.is_empty());
                }
            }
        }
    }

    #[test]
    fn prop_one_execution_per_repetition(policy in policy_strategy(), seed in any::<u64>()) {
        let (records, summary) = run(&policy, seed);
        prop_assert_eq!(records.executions.len(), summary.repetitions);
        prop_assert_eq!(records.ingest.len(), summary.repetitions);
        for (ingest, exec) in records.ingest.iter().zip(&records.executions) {
            prop_assert_eq!(&exec.reference_id, &ingest.id);
        }
    }

    #[test]
    fn prop_ingest_timeline_never_runs_backwards(policy in policy_strategy(), seed in any::<u64>()) {
        let (records, _) = run(&policy, seed);
        for pair in records.ingest.windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at);
        }
        for pair in records.executions.windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn prop_day_end_overrun_is_bounded_by_one_delay(
        start_offset in 0i64..3_600,
        records_per_day in 1usize..2_000,
        seed in any::<u64>(),
    ) {
        // Start within the last hour of the day so most runs hit the boundary.
        let start = Utc.with_ymd_and_hms(2024, 10, 24, 23, 0, 0).unwrap() + Duration::seconds(start_offset);
        let policy = GenerationPolicy {
            end_date: start + Duration::days(1),
            days: 1,
            records_per_day,
            ..GenerationPolicy::default()
        };
        let (records, summary) = run(&policy, seed);
        let day_end = end_of_day(start);

        for record in &records.ingest {
            prop_assert!(record.created_at <= day_end + max_delay());
        }
        if summary.days_rolled_over == 1 {
            prop_assert!(records.ingest.last().unwrap().created_at > day_end);
        }
    }

    #[test]
    fn prop_counters_run_one_to_n(policy in policy_strategy(), seed in any::<u64>()) {
        let (records, _) = run(&policy, seed);
        let metrics = derive_metrics(&records);
        for (samples, expected) in [
            (&metrics.ingest, records.ingest.len()),
            (&metrics.correlation, records.correlation.len()),
            (&metrics.escalation, records.escalation.len()),
        ] {
            prop_assert_eq!(samples.len(), expected);
            for (i, sample) in samples.iter().enumerate() {
                prop_assert_eq!(sample.value, (i + 1) as f64);
            }
        }
    }
}

#[test]
fn one_day_two_chains_scenario() {
    let policy = GenerationPolicy {
        records_per_day: 2,
        ..GenerationPolicy::default()
    };
    let (records, summary) = run(&policy, 2024);

    assert_eq!(summary.repetitions, 4);
    assert_eq!(records.ingest.len(), 4);
    assert_eq!(records.correlation.len(), 4);
    assert_eq!(records.executions.len(), 4);
    assert!((2..=4).contains(&records.escalation.len()));
}
