use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Source of time for cache expiry and the lookback window.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for cache ages.
    fn now(&self) -> Instant;

    /// Calendar date the lookback window is anchored on.
    fn today(&self) -> NaiveDate;
}

/// Wall clock of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            today: Mutex::new(today),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set_today(&self, today: NaiveDate) {
        *self.today.lock() = today;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn today(&self) -> NaiveDate {
        *self.today.lock()
    }
}
