//! Notification capability.
//!
//! Phase changes are announced through a [`Notifier`] injected into the
//! timer. Delivery is best effort: the user preference and the sink's
//! permission are checked first, and any sink error is logged and dropped.

use std::cell::{Cell, RefCell};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NotifyError;
use crate::timer::{Phase, PhaseSwitch};

/// Permission state reported by a notification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Default,
}

pub trait Notifier {
    fn permission(&self) -> Permission;

    /// Ask the backend for permission. Backends without a prompt just
    /// report their current state.
    fn request_permission(&mut self) -> Permission {
        self.permission()
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn request_permission(&mut self) -> Permission {
        (**self).request_permission()
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(title, body)
    }
}

/// Outcome of a gated delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The user preference is off.
    Disabled,
    NotPermitted,
    Failed,
}

/// Send through `notifier` if both the preference and the permission allow.
pub fn deliver<N: Notifier + ?Sized>(
    notifier: &N,
    enabled: bool,
    title: &str,
    body: &str,
) -> Delivery {
    if !enabled {
        return Delivery::Disabled;
    }
    if notifier.permission() != Permission::Granted {
        return Delivery::NotPermitted;
    }
    match notifier.notify(title, body) {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            debug!(error = %e, title, "notification dropped");
            Delivery::Failed
        }
    }
}

/// Title and body announcing the phase a switch entered.
pub fn phase_message(switch: &PhaseSwitch) -> (&'static str, String) {
    match switch.to {
        Phase::Break => (
            "Break started",
            format!("Take a breather for {} minutes", switch.minutes),
        ),
        Phase::Work => (
            "Focus started",
            format!("Time to focus for {} minutes", switch.minutes),
        ),
    }
}

pub const ENABLED_TITLE: &str = "Notifications enabled";
pub const ENABLED_BODY: &str = "You'll be alerted when focus and break phases switch.";

/// No backend available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn permission(&self) -> Permission {
        Permission::Default
    }

    fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable)
    }
}

/// Runs an external program as `<program> [args..] <title> <body>`,
/// e.g. `notify-send`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Build from a command line such as `"notify-send -u low"`.
    ///
    /// Returns `None` for an empty command line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Notifier for CommandNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| NotifyError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

/// Keeps every message it is handed. Useful for embedding hosts that
/// render notifications themselves, and for tests.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    permission: Permission,
    grant_on_request: bool,
    fail: bool,
    attempts: Cell<usize>,
    sent: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn granted() -> Self {
        Self::with_permission(Permission::Granted)
    }

    pub fn with_permission(permission: Permission) -> Self {
        Self {
            permission,
            grant_on_request: false,
            fail: false,
            attempts: Cell::new(0),
            sent: RefCell::new(Vec::new()),
        }
    }

    /// Grant permission the first time it is requested.
    pub fn grant_on_request(mut self) -> Self {
        self.grant_on_request = true;
        self
    }

    /// Reject every message, as a sink blocked by policy would.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.grant_on_request && self.permission == Permission::Default {
            self.permission = Permission::Granted;
        }
        self.permission
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.fail {
            return Err(NotifyError::Rejected("blocked by policy".into()));
        }
        self.sent
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch_to(to: Phase, minutes: u64) -> PhaseSwitch {
        PhaseSwitch {
            from: to.next(),
            to,
            minutes,
            completed_cycles: 1,
        }
    }

    #[test]
    fn deliver_respects_preference_and_permission() {
        let granted = RecordingNotifier::granted();
        assert_eq!(deliver(&granted, false, "t", "b"), Delivery::Disabled);
        assert_eq!(deliver(&granted, true, "t", "b"), Delivery::Sent);
        assert_eq!(granted.sent().len(), 1);

        let denied = RecordingNotifier::with_permission(Permission::Denied);
        assert_eq!(deliver(&denied, true, "t", "b"), Delivery::NotPermitted);
        assert_eq!(denied.attempts(), 0);

        let undecided = RecordingNotifier::with_permission(Permission::Default);
        assert_eq!(deliver(&undecided, true, "t", "b"), Delivery::NotPermitted);
    }

    #[test]
    fn deliver_swallows_sink_errors() {
        let failing = RecordingNotifier::granted().failing();
        assert_eq!(deliver(&failing, true, "t", "b"), Delivery::Failed);
        assert_eq!(failing.attempts(), 1);
        assert!(failing.sent().is_empty());
    }

    #[test]
    fn silent_sink_is_never_permitted() {
        assert_eq!(deliver(&Silent, true, "t", "b"), Delivery::NotPermitted);
    }

    #[test]
    fn phase_messages_name_the_new_phase() {
        let (title, body) = phase_message(&switch_to(Phase::Break, 5));
        assert_eq!(title, "Break started");
        assert!(body.contains("5 minutes"));

        let (title, body) = phase_message(&switch_to(Phase::Work, 25));
        assert_eq!(title, "Focus started");
        assert!(body.contains("25 minutes"));
    }

    #[test]
    fn request_permission_can_grant() {
        let mut n = RecordingNotifier::with_permission(Permission::Default).grant_on_request();
        assert_eq!(n.request_permission(), Permission::Granted);

        let mut denied = RecordingNotifier::with_permission(Permission::Denied).grant_on_request();
        assert_eq!(denied.request_permission(), Permission::Denied);
    }

    #[test]
    fn command_line_parsing() {
        let n = CommandNotifier::from_command_line("notify-send -u low").unwrap();
        assert_eq!(n.program(), "notify-send");
        assert_eq!(n.args, vec!["-u".to_string(), "low".to_string()]);
        assert!(CommandNotifier::from_command_line("   ").is_none());
    }

    #[test]
    fn missing_program_is_an_error_not_a_panic() {
        let n = CommandNotifier::from_command_line("focuscycle-no-such-program-xyz").unwrap();
        assert!(matches!(n.notify("t", "b"), Err(NotifyError::Spawn { .. })));
    }
}
