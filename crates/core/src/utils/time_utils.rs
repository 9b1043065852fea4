use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Source of "now" for everything that ages data: cache expiry and
/// timestamp-recency scoring.
///
/// Services take an `Arc<dyn Clock>` so tests can freeze or advance time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Age of `instant` relative to `now`. Instants in the future count as age zero.
pub fn age_of(instant: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let age = now - instant;
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}
