use std::cell::Cell;

use chrono::Utc;

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<i64>,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now_ms.set(self.now_ms.get() + secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Whole seconds between two epoch-ms readings.
///
/// A clock that went backwards yields zero.
pub fn elapsed_secs(since_ms: i64, now_ms: i64) -> u64 {
    let diff = now_ms.saturating_sub(since_ms);
    if diff <= 0 {
        return 0;
    }
    (diff / 1000) as u64
}

/// Stamp covering exactly `elapsed_sec` replayed seconds after `since_ms`.
///
/// The unreplayed sub-second remainder stays ahead of the stamp and is
/// counted by the next load. A clock that went backwards rebases on `now_ms`.
pub fn replayed_until(since_ms: i64, elapsed_sec: u64, now_ms: i64) -> i64 {
    if now_ms < since_ms {
        return now_ms;
    }
    let replayed_ms = i64::try_from(elapsed_sec)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    since_ms.saturating_add(replayed_ms).min(now_ms)
}
