//! Repeating tick sources.
//!
//! The timer never owns a thread or a callback. It asks a [`TickScheduler`]
//! to register a repeating task and keeps the returned [`TickHandle`];
//! cancelling that handle is the only way ticks stop. The host drives the
//! actual waiting, e.g. by awaiting [`IntervalTicker::fired`] and calling
//! `tick()` on the timer.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Live countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Identifies one registered repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// Registers and cancels repeating tasks.
pub trait TickScheduler {
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle;

    /// Cancelling an unknown or already cancelled handle is a no-op.
    fn cancel(&mut self, handle: TickHandle);
}

/// Scheduler that only records registrations. Ticks are delivered by
/// calling `tick()` on the timer directly.
#[derive(Debug, Default)]
pub struct ManualTicks {
    next_id: u64,
    active: Vec<TickHandle>,
    scheduled_total: u64,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks currently registered.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of registrations ever made.
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled_total
    }
}

impl TickScheduler for ManualTicks {
    fn schedule_repeating(&mut self, _period: Duration) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        self.scheduled_total += 1;
        self.active.push(handle);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.active.retain(|h| *h != handle);
    }
}

/// Tokio-backed scheduler holding at most one interval.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct IntervalTicker {
    next_id: u64,
    active: Option<(TickHandle, Interval)>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves on the next tick of the registered task.
    ///
    /// Pends forever while nothing is registered, so it can sit in a
    /// `select!` next to shutdown signals.
    pub async fn fired(&mut self) -> TickHandle {
        match self.active.as_mut() {
            Some((handle, interval)) => {
                interval.tick().await;
                *handle
            }
            None => std::future::pending().await,
        }
    }
}

impl TickScheduler for IntervalTicker {
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        // First tick one period from now, not immediately.
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.active = Some((handle, interval));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if matches!(self.active, Some((active, _)) if active == handle) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_ticks_track_active_tasks() {
        let mut ticks = ManualTicks::new();
        let a = ticks.schedule_repeating(TICK_PERIOD);
        let b = ticks.schedule_repeating(TICK_PERIOD);
        assert_ne!(a, b);
        assert_eq!(ticks.active_count(), 2);

        ticks.cancel(a);
        ticks.cancel(a);
        assert_eq!(ticks.active_count(), 1);
        assert_eq!(ticks.scheduled_total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_fires_after_one_period() {
        let mut ticker = IntervalTicker::new();
        let handle = ticker.schedule_repeating(TICK_PERIOD);
        let start = Instant::now();
        assert_eq!(ticker.fired().await, handle);
        assert!(start.elapsed() >= TICK_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_interval_never_fires() {
        let mut ticker = IntervalTicker::new();
        let handle = ticker.schedule_repeating(TICK_PERIOD);
        ticker.cancel(handle);

        let fired = tokio::time::timeout(Duration::from_secs(5), ticker.fired()).await;
        assert!(fired.is_err());
    }
}
