//! Property tests for the countdown state machine.

use focuscycle_core::notify::RecordingNotifier;
use focuscycle_core::timer::{ManualClock, ManualTicks, REPLAY_TAIL};
use focuscycle_core::{Durations, FocusTimer, MemoryStore, Phase, TimerSettings, TimerState};
use proptest::prelude::*;

fn running_state(work: u64, brk: u64, is_work: bool, remaining: u64) -> TimerState {
    let phase = if is_work { Phase::Work } else { Phase::Break };
    TimerState::from_parts(Durations::new(work, brk), phase, remaining, 0, true, true, 0)
}

proptest! {
    #[test]
    fn remaining_stays_within_phase_bounds(
        work in 1u64..4,
        brk in 1u64..4,
        ticks in 0usize..1_000,
    ) {
        let mut state = running_state(work, brk, true, work * 60);
        for _ in 0..ticks {
            state.tick();
            prop_assert!(state.remaining_sec() <= state.phase_duration_sec());
            prop_assert!(state.remaining_sec() > 0);
        }
    }

    #[test]
    fn cycles_count_only_work_to_break(
        work in 1u64..4,
        brk in 1u64..4,
        ticks in 0usize..2_000,
    ) {
        let mut state = running_state(work, brk, true, work * 60);
        let mut work_to_break = 0u64;
        for _ in 0..ticks {
            if let Some(switch) = state.tick() {
                if switch.from == Phase::Work {
                    work_to_break += 1;
                }
            }
        }
        prop_assert_eq!(state.completed_cycles(), work_to_break);
    }

    #[test]
    fn advance_matches_ticking_one_second_at_a_time(
        work in 1u64..30,
        brk in 1u64..10,
        is_work in any::<bool>(),
        offset in 0u64..1_800,
        elapsed in 0u64..40_000,
    ) {
        let duration = if is_work { work * 60 } else { brk * 60 };
        let remaining = 1 + offset % duration;
        let mut fast = running_state(work, brk, is_work, remaining);
        let mut slow = fast.clone();

        let caught = fast.advance(elapsed);
        let mut ticked = Vec::new();
        for _ in 0..elapsed {
            if let Some(switch) = slow.tick() {
                ticked.push(switch);
            }
        }
        prop_assert_eq!(caught.phases_skipped, ticked.len() as u64);
        let tail = &ticked[ticked.len().saturating_sub(REPLAY_TAIL)..];
        prop_assert_eq!(caught.recent.as_slice(), tail);
        prop_assert_eq!(fast, slow);
    }

    #[test]
    fn durations_never_drop_below_one_minute(input in proptest::option::of(-1_000i64..1_000)) {
        let clock = ManualClock::at(0);
        let mut timer = FocusTimer::new(
            TimerSettings::default(),
            MemoryStore::new(),
            RecordingNotifier::granted(),
            ManualTicks::new(),
            &clock,
        );
        timer.set_duration(Phase::Work, input);
        timer.set_duration(Phase::Break, input);
        let d = timer.state().durations();
        prop_assert!(d.work_minutes >= 1);
        prop_assert!(d.break_minutes >= 1);
        prop_assert_eq!(timer.state().remaining_sec(), d.work_minutes * 60);
    }
}
