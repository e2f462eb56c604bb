//! Terminal notification sink used when no notification command is set.

use std::io::Write;

use focuscycle_core::{Notifier, NotifyError, Permission};

/// Rings the terminal bell and writes the message to stderr.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        writeln!(err, "\x07{title}: {body}").map_err(|e| NotifyError::Rejected(e.to_string()))
    }
}
