// datacheck-core/src/ports/clock.rs

use chrono::{Local, NaiveDateTime};

/// Source of "now" for time-relative checks (e.g. no future dates).
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Frozen clock, for tests and reproducible re-runs.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
