//! Persisted timer record.
//!
//! The record is a flat JSON object with eight camelCase fields. Loading is
//! all-or-nothing: a payload is accepted only when every field is present
//! with the right JSON type. Numbers are accepted in any JSON form and
//! normalised (floored, durations at least one minute, counters at least
//! zero), so payloads written by other front-ends still load.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PayloadError;
use crate::timer::{Durations, Phase, TimerState};

/// Storage key for the current record layout. Bump to orphan old payloads.
pub const STORAGE_KEY: &str = "pomodoro-v2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub work_minutes: u64,
    pub break_minutes: u64,
    pub is_work: bool,
    pub remaining_sec: u64,
    pub completed: u64,
    pub running: bool,
    /// Epoch milliseconds of the write.
    pub last_tick_at: i64,
    pub notify_on: bool,
}

impl PersistedRecord {
    pub fn from_state(state: &TimerState) -> Self {
        let durations = state.durations();
        Self {
            work_minutes: durations.work_minutes,
            break_minutes: durations.break_minutes,
            is_work: state.phase().is_work(),
            remaining_sec: state.remaining_sec(),
            completed: state.completed_cycles(),
            running: state.is_running(),
            last_tick_at: state.last_persisted_at_ms(),
            notify_on: state.notify_enabled(),
        }
    }

    pub fn into_state(self) -> TimerState {
        let phase = if self.is_work { Phase::Work } else { Phase::Break };
        TimerState::from_parts(
            Durations::new(self.work_minutes, self.break_minutes),
            phase,
            self.remaining_sec,
            self.completed,
            self.running,
            self.notify_on,
            self.last_tick_at,
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and type-check a stored payload.
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(raw).map_err(PayloadError::Malformed)?;
        let obj = value.as_object().ok_or(PayloadError::NotAnObject)?;

        // Check every field before normalising any of them.
        let work_minutes = number(obj, "workMinutes")?;
        let break_minutes = number(obj, "breakMinutes")?;
        let remaining_sec = number(obj, "remainingSec")?;
        let completed = number(obj, "completed")?;
        let is_work = boolean(obj, "isWork")?;
        let running = boolean(obj, "running")?;
        let last_tick_at = number(obj, "lastTickAt")?;
        let notify_on = boolean(obj, "notifyOn")?;

        Ok(Self {
            work_minutes: floor_at(work_minutes, 1.0),
            break_minutes: floor_at(break_minutes, 1.0),
            is_work,
            remaining_sec: floor_at(remaining_sec, 0.0),
            completed: floor_at(completed, 0.0),
            running,
            // Stamps before the epoch carry no usable gap; `as` saturates above.
            last_tick_at: last_tick_at.floor().max(0.0) as i64,
            notify_on,
        })
    }
}

fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, PayloadError> {
    obj.get(name).ok_or(PayloadError::MissingField(name))
}

fn number(obj: &Map<String, Value>, name: &'static str) -> Result<f64, PayloadError> {
    field(obj, name)?
        .as_f64()
        .ok_or(PayloadError::WrongType {
            field: name,
            expected: "number",
        })
}

fn boolean(obj: &Map<String, Value>, name: &'static str) -> Result<bool, PayloadError> {
    field(obj, name)?
        .as_bool()
        .ok_or(PayloadError::WrongType {
            field: name,
            expected: "boolean",
        })
}

fn floor_at(n: f64, min: f64) -> u64 {
    n.floor().max(min) as u64
}
