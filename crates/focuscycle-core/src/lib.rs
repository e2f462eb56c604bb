//! # focuscycle Core Library
//!
//! This library provides a resumable work/break interval timer. The state
//! survives restarts: every change is written to a key-value store, and a
//! timer that was running when the process went away is fast-forwarded by
//! the wall-clock time that has passed before it resumes ticking.
//!
//! ## Architecture
//!
//! - **Timer State**: a pure countdown state machine over
//!   `(state, elapsed seconds) -> state`, with no clock or I/O
//! - **Timer Engine**: owns the state plus its collaborators (store,
//!   notification sink, tick scheduler, clock) and persists after every
//!   operation
//! - **Storage**: SQLite key-value store and TOML-based configuration
//! - **Notifications**: best-effort capability gated by user preference and
//!   backend permission
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: the timer instance a host owns
//! - [`TimerState`]: countdown state and transitions
//! - [`PersistedRecord`]: the stored JSON record
//! - [`Database`]: SQLite-backed [`StateStore`]
//! - [`Config`]: application configuration management
//! - [`Notifier`]: notification sink trait

pub mod error;
pub mod events;
pub mod notify;
pub mod persist;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, PayloadError, StorageError};
pub use events::Event;
pub use notify::{CommandNotifier, Notifier, Permission, RecordingNotifier, Silent};
pub use persist::{PersistedRecord, STORAGE_KEY};
pub use storage::{Config, Database, MemoryStore, StateStore};
pub use timer::{
    CatchUp, CatchUpNotify, Durations, FocusTimer, IntervalTicker, ManualTicks, Phase, PhaseSwitch,
    SystemClock, TimerSettings, TimerState,
};
