//! Two independent logical clocks advanced by randomized processing delays.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Shared by ingest, correlation and escalation records.
    Ingest,
    /// Drives execution records only.
    Execution,
}

#[derive(Debug, Clone)]
pub struct ClockDriver {
    ingest: DateTime<Utc>,
    execution: DateTime<Utc>,
}

impl ClockDriver {
    pub fn new(ingest: DateTime<Utc>, execution: DateTime<Utc>) -> Self {
        Self { ingest, execution }
    }

    /// Ingest clock starts `days` before `end`, the execution clock `days` before that.
    pub fn seeded(end: DateTime<Utc>, days: u32) -> Self {
        let span = Duration::days(i64::from(days));
        let ingest = end - span;
        Self::new(ingest, ingest - span)
    }

    pub fn now(&self, clock: ClockKind) -> DateTime<Utc> {
        match clock {
            ClockKind::Ingest => self.ingest,
            ClockKind::Execution => self.execution,
        }
    }

    /// Adds one random delay to `clock` and returns its new value.
    ///
    /// No bound is enforced here; the chain builder owns the day-boundary policy.
    pub fn advance<R: Rng + ?Sized>(&mut self, clock: ClockKind, rng: &mut R) -> DateTime<Utc> {
        let delay = random_delay(rng);
        let slot = self.slot_mut(clock);
        *slot = *slot + delay;
        *slot
    }

    pub fn set(&mut self, clock: ClockKind, at: DateTime<Utc>) {
        *self.slot_mut(clock) = at;
    }

    fn slot_mut(&mut self, clock: ClockKind) -> &mut DateTime<Utc> {
        match clock {
            ClockKind::Ingest => &mut self.ingest,
            ClockKind::Execution => &mut self.execution,
        }
    }
}

/// 1 or 2 seconds plus 0..=999 milliseconds.
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    let seconds: i64 = rng.random_range(1..=2);
    let millis: i64 = rng.random_range(0..1000);
    Duration::seconds(seconds) + Duration::milliseconds(millis)
}

/// Longest delay a single `advance` can apply.
pub fn max_delay() -> Duration {
    Duration::seconds(2) + Duration::milliseconds(999)
}
