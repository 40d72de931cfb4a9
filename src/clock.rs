use crate::calendar;
use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Real time that passes between two wall-clock readings.
    fn interval(&self, from: NaiveDateTime, to: NaiveDateTime) -> chrono::Duration {
        to - from
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn interval(&self, from: NaiveDateTime, to: NaiveDateTime) -> chrono::Duration {
        calendar::elapsed_in(&Local, from, to)
    }
}

/// Settable clock for tests.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<NaiveDateTime>,
}

impl MockClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}
