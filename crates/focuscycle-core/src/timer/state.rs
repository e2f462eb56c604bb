//! Pure countdown state.
//!
//! [`TimerState`] knows nothing about clocks, storage or notification
//! backends. Every transition is a plain function of the current state and
//! a number of elapsed seconds, which keeps catch-up replay and live ticking
//! on exactly the same code path.

use serde::{Deserialize, Serialize};

use super::phase::{clamp_minutes, Durations, Phase};

/// Record of a single zero crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSwitch {
    pub from: Phase,
    pub to: Phase,
    /// Length of the phase just entered.
    pub minutes: u64,
    /// Completed cycles after this switch.
    pub completed_cycles: u64,
}

/// Most recent switches kept by [`TimerState::advance`].
pub const REPLAY_TAIL: usize = 4;

/// Outcome of replaying elapsed time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatchUp {
    /// Zero crossings in the replayed span.
    pub phases_skipped: u64,
    /// The last switches in order, at most [`REPLAY_TAIL`] of them.
    pub recent: Vec<PhaseSwitch>,
}

impl CatchUp {
    /// The switch into the phase the countdown ended up in.
    pub fn latest(&self) -> Option<&PhaseSwitch> {
        self.recent.last()
    }

    fn record(&mut self, switch: PhaseSwitch) {
        self.phases_skipped = self.phases_skipped.saturating_add(1);
        if self.recent.len() == REPLAY_TAIL {
            self.recent.remove(0);
        }
        self.recent.push(switch);
    }
}

/// Snapshot of the countdown.
///
/// `remaining_sec` always lies within `0..=phase_duration_sec()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    durations: Durations,
    phase: Phase,
    remaining_sec: u64,
    completed_cycles: u64,
    running: bool,
    notify_enabled: bool,
    /// Wall-clock time (epoch ms) of the last persist.
    last_persisted_at_ms: i64,
}

impl TimerState {
    /// Fresh state: paused at the start of a work phase.
    pub fn new(durations: Durations, notify_enabled: bool) -> Self {
        Self {
            durations,
            phase: Phase::Work,
            remaining_sec: durations.secs(Phase::Work),
            completed_cycles: 0,
            running: false,
            notify_enabled,
            last_persisted_at_ms: 0,
        }
    }

    /// Rebuild a state from loaded values.
    ///
    /// `remaining_sec` is capped at the phase length so the range invariant
    /// holds even for hand-edited payloads.
    pub fn from_parts(
        durations: Durations,
        phase: Phase,
        remaining_sec: u64,
        completed_cycles: u64,
        running: bool,
        notify_enabled: bool,
        last_persisted_at_ms: i64,
    ) -> Self {
        Self {
            durations,
            phase,
            remaining_sec: remaining_sec.min(durations.secs(phase)),
            completed_cycles,
            running,
            notify_enabled,
            last_persisted_at_ms,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_sec(&self) -> u64 {
        self.remaining_sec
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn notify_enabled(&self) -> bool {
        self.notify_enabled
    }

    pub fn last_persisted_at_ms(&self) -> i64 {
        self.last_persisted_at_ms
    }

    pub fn phase_duration_sec(&self) -> u64 {
        self.durations.secs(self.phase)
    }

    /// Countdown as `MM:SS`. Minutes are not wrapped at 60.
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.remaining_sec / 60, self.remaining_sec % 60)
    }

    /// 0.0 .. 100.0 progress within the current phase.
    pub fn progress_pct(&self) -> f64 {
        let total = self.phase_duration_sec();
        if total == 0 {
            return 0.0;
        }
        let done = total.saturating_sub(self.remaining_sec) as f64;
        (done / total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Progress rounded to a whole percent.
    pub fn percent(&self) -> u8 {
        self.progress_pct().round() as u8
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// One second of live countdown. No-op while paused.
    ///
    /// Returns the switch when this tick crossed zero. A tick that finds
    /// the countdown already at zero switches right away.
    pub fn tick(&mut self) -> Option<PhaseSwitch> {
        if !self.running {
            return None;
        }
        self.remaining_sec = self.remaining_sec.saturating_sub(1);
        if self.remaining_sec == 0 {
            return Some(self.switch_phase());
        }
        None
    }

    /// Enter the other phase with its full duration.
    ///
    /// Only WORK -> BREAK counts as a completed cycle.
    pub fn switch_phase(&mut self) -> PhaseSwitch {
        let from = self.phase;
        if from.is_work() {
            self.completed_cycles = self.completed_cycles.saturating_add(1);
        }
        self.phase = from.next();
        self.remaining_sec = self.phase_duration_sec();
        PhaseSwitch {
            from,
            to: self.phase,
            minutes: self.durations.minutes(self.phase),
            completed_cycles: self.completed_cycles,
        }
    }

    /// Replay `elapsed_sec` seconds of countdown in one step.
    ///
    /// Ends in exactly the state that many calls to [`tick`](Self::tick)
    /// would produce. Whole work+break cycles are skipped arithmetically, so
    /// the cost does not grow with the length of the gap; only the last
    /// couple of cycles are walked switch by switch to fill `recent`.
    pub fn advance(&mut self, mut elapsed_sec: u64) -> CatchUp {
        let cycle_sec = self
            .durations
            .secs(Phase::Work)
            .saturating_add(self.durations.secs(Phase::Break));
        let mut caught = CatchUp::default();
        while elapsed_sec > 0 {
            if elapsed_sec < self.remaining_sec {
                self.remaining_sec -= elapsed_sec;
                break;
            }
            elapsed_sec -= self.remaining_sec;
            caught.record(self.switch_phase());

            // At a phase start a whole cycle lands back on this phase with
            // one more completed cycle. Keep two cycles to walk for the tail.
            let whole = elapsed_sec / cycle_sec;
            if whole > 2 {
                let skip = whole - 2;
                elapsed_sec -= skip * cycle_sec;
                self.completed_cycles = self.completed_cycles.saturating_add(skip);
                caught.phases_skipped = caught.phases_skipped.saturating_add(skip * 2);
                caught.recent.clear();
            }
        }
        caught
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Back to the start of a work phase, paused. Cycles are kept.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_sec = self.durations.secs(Phase::Work);
    }

    /// Apply a duration edit for `phase`.
    ///
    /// While paused in the edited phase the countdown is resized at once;
    /// otherwise the new length applies on the next entry into that phase.
    /// Returns the minutes actually stored.
    pub fn set_minutes(&mut self, phase: Phase, input: Option<i64>) -> u64 {
        let minutes = clamp_minutes(input, self.durations.minutes(phase));
        match phase {
            Phase::Work => self.durations.work_minutes = minutes,
            Phase::Break => self.durations.break_minutes = minutes,
        }
        if !self.running && self.phase == phase {
            self.remaining_sec = self.durations.secs(phase);
        }
        minutes
    }

    pub fn set_notify_enabled(&mut self, enabled: bool) {
        self.notify_enabled = enabled;
    }

    /// Restore default durations and preference, then [`reset`](Self::reset).
    pub fn restore_defaults(&mut self, durations: Durations, notify_enabled: bool) {
        self.durations = durations;
        self.notify_enabled = notify_enabled;
        self.reset();
    }

    pub(crate) fn stamp(&mut self, now_ms: i64) {
        self.last_persisted_at_ms = now_ms;
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(Durations::default(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(work: u64, brk: u64) -> TimerState {
        let mut state = TimerState::new(Durations::new(work, brk), true);
        state.set_running(true);
        state
    }

    #[test]
    fn defaults_match_a_classic_pomodoro() {
        let state = TimerState::default();
        assert_eq!(state.phase(), Phase::Work);
        assert_eq!(state.remaining_sec(), 25 * 60);
        assert_eq!(state.completed_cycles(), 0);
        assert!(!state.is_running());
        assert!(state.notify_enabled());
    }

    #[test]
    fn tick_ignored_while_paused() {
        let mut state = TimerState::default();
        assert!(state.tick().is_none());
        assert_eq!(state.remaining_sec(), 25 * 60);
    }

    #[test]
    fn tick_switches_on_zero_crossing() {
        let mut state = running(1, 1);
        for _ in 0..59 {
            assert!(state.tick().is_none());
        }
        let switch = state.tick().unwrap();
        assert_eq!(switch.from, Phase::Work);
        assert_eq!(switch.to, Phase::Break);
        assert_eq!(switch.completed_cycles, 1);
        assert_eq!(state.remaining_sec(), 60);
    }

    #[test]
    fn break_to_work_does_not_count() {
        let mut state = running(1, 1);
        state.switch_phase();
        let switch = state.switch_phase();
        assert_eq!(switch.to, Phase::Work);
        assert_eq!(state.completed_cycles(), 1);
        assert_eq!(state.remaining_sec(), 60);
    }

    #[test]
    fn advance_fast_forwards_whole_phases() {
        let mut state = TimerState::from_parts(
            Durations::new(25, 5),
            Phase::Work,
            10,
            0,
            true,
            true,
            0,
        );
        let caught = state.advance(10 + 300 + 20);
        assert_eq!(caught.phases_skipped, 2);
        assert_eq!(caught.recent.len(), 2);
        assert_eq!(caught.latest().map(|s| s.to), Some(Phase::Work));
        assert_eq!(state.phase(), Phase::Work);
        assert_eq!(state.remaining_sec(), 1480);
        assert_eq!(state.completed_cycles(), 1);
    }

    #[test]
    fn advance_from_zero_switches_immediately() {
        let mut state =
            TimerState::from_parts(Durations::new(1, 1), Phase::Work, 0, 0, true, true, 0);
        let caught = state.advance(1);
        assert_eq!(caught.phases_skipped, 1);
        assert_eq!(state.phase(), Phase::Break);
        assert_eq!(state.remaining_sec(), 59);
    }

    #[test]
    fn advance_by_zero_is_noop() {
        let mut state = running(25, 5);
        let before = state.clone();
        assert_eq!(state.advance(0), CatchUp::default());
        assert_eq!(state, before);
    }

    #[test]
    fn advance_skips_decades_without_walking_them() {
        let mut state =
            TimerState::from_parts(Durations::new(1, 1), Phase::Work, 60, 0, true, true, 0);
        // About 54 years of one-minute phases.
        let caught = state.advance(1_700_000_000);
        assert_eq!(caught.phases_skipped, 28_333_333);
        assert_eq!(state.completed_cycles(), 14_166_667);
        assert_eq!(state.phase(), Phase::Break);
        assert_eq!(state.remaining_sec(), 40);

        assert_eq!(caught.recent.len(), REPLAY_TAIL);
        let last = caught.latest().unwrap();
        assert_eq!(last.to, Phase::Break);
        assert_eq!(last.completed_cycles, 14_166_667);
        assert_eq!(caught.recent[2].to, Phase::Work);
        assert_eq!(caught.recent[2].completed_cycles, 14_166_666);
    }

    #[test]
    fn advance_survives_the_largest_gap() {
        let mut state = running(25, 5);
        let caught = state.advance(u64::MAX);
        assert!(caught.phases_skipped > 0);
        assert!(state.remaining_sec() <= state.phase_duration_sec());
    }

    #[test]
    fn from_parts_caps_remaining() {
        let state =
            TimerState::from_parts(Durations::new(1, 1), Phase::Break, 9_999, 0, false, true, 0);
        assert_eq!(state.remaining_sec(), 60);
    }

    #[test]
    fn edit_while_paused_resizes_current_phase() {
        let mut state = TimerState::default();
        assert_eq!(state.set_minutes(Phase::Work, Some(10)), 10);
        assert_eq!(state.remaining_sec(), 600);

        state.set_minutes(Phase::Break, Some(9));
        assert_eq!(state.remaining_sec(), 600);
    }

    #[test]
    fn edit_while_running_waits_for_next_phase() {
        let mut state = running(25, 5);
        state.set_minutes(Phase::Work, Some(10));
        assert_eq!(state.remaining_sec(), 25 * 60);
        state.switch_phase();
        state.switch_phase();
        assert_eq!(state.remaining_sec(), 600);
    }

    #[test]
    fn reset_keeps_cycles() {
        let mut state = running(25, 5);
        state.switch_phase();
        state.reset();
        assert_eq!(state.phase(), Phase::Work);
        assert_eq!(state.remaining_sec(), 25 * 60);
        assert_eq!(state.completed_cycles(), 1);
        assert!(!state.is_running());
    }

    #[test]
    fn clock_and_progress() {
        let state =
            TimerState::from_parts(Durations::new(25, 5), Phase::Work, 754, 0, false, true, 0);
        assert_eq!(state.clock(), "12:34");
        assert_eq!(state.percent(), 50);

        let long =
            TimerState::from_parts(Durations::new(90, 5), Phase::Work, 90 * 60, 0, false, true, 0);
        assert_eq!(long.clock(), "90:00");
        assert_eq!(long.percent(), 0);
    }
}
