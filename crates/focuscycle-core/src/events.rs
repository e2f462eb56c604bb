use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::Permission;
use crate::timer::Phase;

/// Every operation on the timer produces an Event.
/// Hosts render them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_sec: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_sec: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_sec: u64,
        at: DateTime<Utc>,
    },
    PhaseSwitched {
        from: Phase,
        to: Phase,
        /// Length of the phase just entered.
        minutes: u64,
        completed_cycles: u64,
        at: DateTime<Utc>,
    },
    DurationChanged {
        phase: Phase,
        minutes: u64,
        remaining_sec: u64,
        at: DateTime<Utc>,
    },
    SettingsRestored {
        work_minutes: u64,
        break_minutes: u64,
        notify_enabled: bool,
        at: DateTime<Utc>,
    },
    NotificationsToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    PermissionChecked {
        permission: Permission,
        at: DateTime<Utc>,
    },
    /// Wall-clock time replayed after loading a running timer.
    CaughtUp {
        elapsed_secs: u64,
        phases_skipped: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        remaining_sec: u64,
        total_sec: u64,
        clock: String,
        percent: u8,
        completed_cycles: u64,
        work_minutes: u64,
        break_minutes: u64,
        notify_enabled: bool,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_type_tag() {
        let event = Event::PhaseSwitched {
            from: Phase::Work,
            to: Phase::Break,
            minutes: 5,
            completed_cycles: 1,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhaseSwitched");
        assert_eq!(json["to"], "break");
    }
}
