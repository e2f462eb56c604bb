mod clock;
mod engine;
mod phase;
mod state;
mod ticker;

pub use clock::{elapsed_secs, replayed_until, Clock, ManualClock, SystemClock};
pub use engine::{CatchUpNotify, FocusTimer, TimerSettings};
pub use phase::{
    clamp_minutes, parse_minutes, Durations, Phase, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
    MIN_MINUTES,
};
pub use state::{CatchUp, PhaseSwitch, TimerState, REPLAY_TAIL};
pub use ticker::{IntervalTicker, ManualTicks, TickHandle, TickScheduler, TICK_PERIOD};
