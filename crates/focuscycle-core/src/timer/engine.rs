//! Timer engine implementation.
//!
//! [`FocusTimer`] wraps the pure [`TimerState`] with its collaborators: a
//! key-value store, a notification sink, a tick scheduler and a clock. It
//! does not use internal threads - the host awaits the scheduler and calls
//! `tick()` once per second while the timer is running.
//!
//! ## Lifecycle
//!
//! ```text
//! new -> restore (validate, catch up, resume) -> operations ... -> (persist after each)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = FocusTimer::new(settings, store, notifier, IntervalTicker::new(), SystemClock);
//! timer.restore();
//! timer.start();
//! // In a loop:
//! timer.ticks_mut().fired().await;
//! timer.tick(); // Returns Some(Event::PhaseSwitched) on a zero crossing
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{elapsed_secs, replayed_until, Clock};
use super::phase::{Durations, Phase};
use super::state::{CatchUp, PhaseSwitch, TimerState};
use super::ticker::{TickHandle, TickScheduler, TICK_PERIOD};
use crate::events::Event;
use crate::notify::{deliver, phase_message, Delivery, Notifier, Permission, ENABLED_BODY, ENABLED_TITLE};
use crate::persist::{PersistedRecord, STORAGE_KEY};
use crate::storage::{Config, StateStore};

/// Which phase switches replayed during catch-up are announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatchUpNotify {
    /// One notification per replayed switch.
    All,
    /// Only the switch into the phase the user returns to.
    #[default]
    Latest,
    None,
}

/// Host-level settings that are not part of the persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    /// Durations restored by "reset settings" and used on first run.
    pub defaults: Durations,
    pub notify_default: bool,
    pub storage_key: String,
    pub catch_up: CatchUpNotify,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            defaults: Durations::default(),
            notify_default: true,
            storage_key: STORAGE_KEY.to_string(),
            catch_up: CatchUpNotify::default(),
        }
    }
}

impl From<&Config> for TimerSettings {
    fn from(config: &Config) -> Self {
        Self {
            defaults: config.durations(),
            notify_default: config.notifications.enabled,
            storage_key: config.timer.storage_key.clone(),
            catch_up: config.notifications.catch_up,
        }
    }
}

/// A resumable work/break countdown.
///
/// Holds at most one registered tick task; `tick_handle.is_some()` exactly
/// when the state says it is running.
pub struct FocusTimer<S, N, T, C> {
    state: TimerState,
    settings: TimerSettings,
    store: S,
    notifier: N,
    ticks: T,
    clock: C,
    tick_handle: Option<TickHandle>,
}

impl<S, N, T, C> FocusTimer<S, N, T, C>
where
    S: StateStore,
    N: Notifier,
    T: TickScheduler,
    C: Clock,
{
    /// Create a paused timer at the configured defaults.
    ///
    /// Nothing is read or written until [`restore`](Self::restore) or the
    /// first operation.
    pub fn new(settings: TimerSettings, store: S, notifier: N, ticks: T, clock: C) -> Self {
        let state = TimerState::new(settings.defaults, settings.notify_default);
        Self {
            state,
            settings,
            store,
            notifier,
            ticks,
            clock,
            tick_handle: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_handle.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn ticks_mut(&mut self) -> &mut T {
        &mut self.ticks
    }

    pub fn permission(&self) -> Permission {
        self.notifier.permission()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        snapshot_of(&self.state)
    }

    /// Snapshot of the state a [`restore`](Self::restore) would resume to.
    ///
    /// Reads the stored record and replays the gap on a copy. Nothing is
    /// written, notified or scheduled, and `self` is left untouched.
    pub fn peek(&self) -> Event {
        match self.load_record() {
            Some(mut saved) => {
                if saved.is_running() {
                    let elapsed = elapsed_secs(saved.last_persisted_at_ms(), self.clock.now_ms());
                    saved.advance(elapsed);
                }
                snapshot_of(&saved)
            }
            None => self.snapshot(),
        }
    }

    // ── Recovery ─────────────────────────────────────────────────────

    /// Load the stored record and resume from it.
    ///
    /// A missing, unreadable or malformed record leaves the defaults in
    /// place; nothing is surfaced to the caller beyond a log line.
    pub fn restore(&mut self) -> Vec<Event> {
        match self.load_record() {
            Some(saved) => {
                let now = self.clock.now_ms();
                self.resume_from_persisted(saved, now)
            }
            None => Vec::new(),
        }
    }

    /// Adopt `saved` and, if it was running, replay the wall-clock time
    /// since it was written before resuming live ticks.
    ///
    /// A paused record is restored verbatim and stays paused.
    pub fn resume_from_persisted(&mut self, saved: TimerState, now_ms: i64) -> Vec<Event> {
        self.cancel_ticks();
        let was_running = saved.is_running();
        self.state = saved;
        self.state.set_running(false);

        if !was_running {
            debug!(remaining = self.state.remaining_sec(), "restored paused timer");
            return Vec::new();
        }

        let since = self.state.last_persisted_at_ms();
        let elapsed = elapsed_secs(since, now_ms);
        let caught = self.state.advance(elapsed);
        info!(
            elapsed_secs = elapsed,
            phases_skipped = caught.phases_skipped,
            completed_cycles = self.state.completed_cycles(),
            "caught up running timer"
        );
        self.announce_catch_up(&caught);

        // The sub-second remainder was not replayed; leave it for the next load.
        self.state.stamp(replayed_until(since, elapsed, now_ms));
        let mut events = vec![Event::CaughtUp {
            elapsed_secs: elapsed,
            phases_skipped: caught.phases_skipped,
            at: Utc::now(),
        }];
        events.push(self.begin_ticking());
        events
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin ticking. Returns `None` when already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running() {
            return None;
        }
        self.state.stamp(self.clock.now_ms());
        Some(self.begin_ticking())
    }

    /// Stop ticking. Returns `None` when already paused.
    pub fn pause(&mut self) -> Option<Event> {
        self.cancel_ticks();
        if !self.state.is_running() {
            return None;
        }
        self.state.set_running(false);
        self.persist();
        info!(remaining = self.state.remaining_sec(), "timer paused");
        Some(Event::TimerPaused {
            phase: self.state.phase(),
            remaining_sec: self.state.remaining_sec(),
            at: Utc::now(),
        })
    }

    /// Pause and rewind to the start of a work phase. Cycles are kept.
    pub fn reset(&mut self) -> Event {
        self.cancel_ticks();
        self.state.reset();
        self.persist();
        info!("timer reset");
        Event::TimerReset {
            remaining_sec: self.state.remaining_sec(),
            at: Utc::now(),
        }
    }

    /// One second of countdown, delivered by the tick task.
    ///
    /// Returns `Some(Event::PhaseSwitched)` when the phase changes.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running() {
            return None;
        }
        let switch = self.state.tick();
        self.persist();
        let switch = switch?;
        info!(from = %switch.from, to = %switch.to, cycles = switch.completed_cycles, "phase switched");
        self.announce(&switch);
        Some(switch_event(&switch, Utc::now()))
    }

    /// Edit a phase length. `None` or zero keeps the current value;
    /// anything below one minute becomes one minute.
    pub fn set_duration(&mut self, phase: Phase, minutes: Option<i64>) -> Event {
        let minutes = self.state.set_minutes(phase, minutes);
        self.persist();
        debug!(%phase, minutes, "duration changed");
        Event::DurationChanged {
            phase,
            minutes,
            remaining_sec: self.state.remaining_sec(),
            at: Utc::now(),
        }
    }

    pub fn set_work_duration(&mut self, minutes: i64) -> Event {
        self.set_duration(Phase::Work, Some(minutes))
    }

    pub fn set_break_duration(&mut self, minutes: i64) -> Event {
        self.set_duration(Phase::Break, Some(minutes))
    }

    /// Restore default durations and notification preference, then reset.
    pub fn reset_settings_to_defaults(&mut self) -> Event {
        self.cancel_ticks();
        self.state
            .restore_defaults(self.settings.defaults, self.settings.notify_default);
        self.persist();
        info!("settings restored to defaults");
        Event::SettingsRestored {
            work_minutes: self.settings.defaults.work_minutes,
            break_minutes: self.settings.defaults.break_minutes,
            notify_enabled: self.settings.notify_default,
            at: Utc::now(),
        }
    }

    pub fn set_notify(&mut self, enabled: bool) -> Event {
        self.state.set_notify_enabled(enabled);
        self.persist();
        Event::NotificationsToggled {
            enabled,
            at: Utc::now(),
        }
    }

    /// Ask the sink for permission; on success send a confirmation.
    pub fn request_notification_permission(&mut self) -> Event {
        let permission = self.notifier.request_permission();
        if permission == Permission::Granted {
            deliver(
                &self.notifier,
                self.state.notify_enabled(),
                ENABLED_TITLE,
                ENABLED_BODY,
            );
        }
        Event::PermissionChecked {
            permission,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Read and validate the stored record. Problems are logged and
    /// reported as `None`.
    fn load_record(&self) -> Option<TimerState> {
        let key = &self.settings.storage_key;
        let raw = match self.store.load(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "no stored timer state");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read timer state, using defaults");
                return None;
            }
        };
        match PersistedRecord::from_json(&raw) {
            Ok(record) => Some(record.into_state()),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding stored timer state, using defaults");
                None
            }
        }
    }

    /// Register the tick task and persist with the current stamp.
    fn begin_ticking(&mut self) -> Event {
        // A stale registration would double the tick rate.
        self.cancel_ticks();
        self.tick_handle = Some(self.ticks.schedule_repeating(TICK_PERIOD));
        self.state.set_running(true);
        self.write();
        info!(phase = %self.state.phase(), remaining = self.state.remaining_sec(), "timer started");
        Event::TimerStarted {
            phase: self.state.phase(),
            remaining_sec: self.state.remaining_sec(),
            at: Utc::now(),
        }
    }

    fn cancel_ticks(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.ticks.cancel(handle);
        }
    }

    /// Write the full record with a fresh timestamp.
    fn persist(&mut self) {
        self.state.stamp(self.clock.now_ms());
        self.write();
    }

    /// Write the full record as is. Failures are logged.
    fn write(&mut self) {
        let record = PersistedRecord::from_state(&self.state);
        let json = match record.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode timer state");
                return;
            }
        };
        if let Err(e) = self.store.save(&self.settings.storage_key, &json) {
            warn!(error = %e, "failed to persist timer state");
        }
    }

    fn announce(&self, switch: &PhaseSwitch) -> Delivery {
        let (title, body) = phase_message(switch);
        deliver(&self.notifier, self.state.notify_enabled(), title, &body)
    }

    /// `All` covers the replayed tail; older switches are only counted.
    fn announce_catch_up(&self, caught: &CatchUp) {
        match self.settings.catch_up {
            CatchUpNotify::All => {
                for switch in &caught.recent {
                    self.announce(switch);
                }
            }
            CatchUpNotify::Latest => {
                if let Some(last) = caught.latest() {
                    self.announce(last);
                }
            }
            CatchUpNotify::None => {}
        }
    }
}

fn snapshot_of(state: &TimerState) -> Event {
    let durations = state.durations();
    Event::StateSnapshot {
        phase: state.phase(),
        running: state.is_running(),
        remaining_sec: state.remaining_sec(),
        total_sec: state.phase_duration_sec(),
        clock: state.clock(),
        percent: state.percent(),
        completed_cycles: state.completed_cycles(),
        work_minutes: durations.work_minutes,
        break_minutes: durations.break_minutes,
        notify_enabled: state.notify_enabled(),
        at: Utc::now(),
    }
}

fn switch_event(switch: &PhaseSwitch, at: chrono::DateTime<Utc>) -> Event {
    Event::PhaseSwitched {
        from: switch.from,
        to: switch.to,
        minutes: switch.minutes,
        completed_cycles: switch.completed_cycles,
        at,
    }
}
