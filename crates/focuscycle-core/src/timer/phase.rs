use serde::{Deserialize, Serialize};

/// Default focus length in minutes.
pub const DEFAULT_WORK_MINUTES: u64 = 25;
/// Default break length in minutes.
pub const DEFAULT_BREAK_MINUTES: u64 = 5;
/// Durations never drop below one minute.
pub const MIN_MINUTES: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    /// The phase entered when this one runs out.
    pub fn next(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn is_work(self) -> bool {
        self == Phase::Work
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Configured phase lengths, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub work_minutes: u64,
    pub break_minutes: u64,
}

impl Durations {
    /// Build durations, flooring each at one minute.
    pub fn new(work_minutes: u64, break_minutes: u64) -> Self {
        Self {
            work_minutes: work_minutes.max(MIN_MINUTES),
            break_minutes: break_minutes.max(MIN_MINUTES),
        }
    }

    pub fn minutes(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    /// Length of `phase` in seconds.
    ///
    /// Saturates instead of overflowing for absurd minute counts.
    pub fn secs(&self, phase: Phase) -> u64 {
        self.minutes(phase).saturating_mul(60)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_MINUTES, DEFAULT_BREAK_MINUTES)
    }
}

/// Resolve user-supplied minutes the way the settings form does.
///
/// Unparseable or zero input falls back to `previous`; negative input is
/// floored. The result is always at least [`MIN_MINUTES`].
pub fn clamp_minutes(input: Option<i64>, previous: u64) -> u64 {
    match input {
        Some(0) | None => previous.max(MIN_MINUTES),
        Some(n) if n < 0 => MIN_MINUTES,
        Some(n) => (n as u64).max(MIN_MINUTES),
    }
}

/// Parse free-form minute input (e.g. from a CLI argument or text field).
pub fn parse_minutes(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_alternates() {
        assert_eq!(Phase::Work.next(), Phase::Break);
        assert_eq!(Phase::Break.next(), Phase::Work);
    }

    #[test]
    fn durations_floor_at_one_minute() {
        let d = Durations::new(0, 0);
        assert_eq!(d.work_minutes, 1);
        assert_eq!(d.break_minutes, 1);
        assert_eq!(d.secs(Phase::Work), 60);
    }

    #[test]
    fn clamp_keeps_previous_on_bad_input() {
        assert_eq!(clamp_minutes(None, 25), 25);
        assert_eq!(clamp_minutes(Some(0), 25), 25);
        assert_eq!(clamp_minutes(Some(-3), 7), 1);
        assert_eq!(clamp_minutes(Some(10), 25), 10);
    }

    #[test]
    fn parse_minutes_accepts_decimals() {
        assert_eq!(parse_minutes(" 12 "), Some(12));
        assert_eq!(parse_minutes("7.9"), Some(7));
        assert_eq!(parse_minutes("abc"), None);
        assert_eq!(parse_minutes(""), None);
    }
}
