//! Terminal notifications.

use std::io::Write;

use att_core::{Notification, Severity};
use att_tracker::Notifier;

/// Prints notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        let line = format_notification(notification);
        let mut stderr = std::io::stderr().lock();
        if let Err(err) = writeln!(stderr, "{line}") {
            tracing::warn!(error = %err, "failed to print notification");
        }
    }
}

/// One line for the terminal, prefixed by severity. Warnings ring the bell.
pub fn format_notification(notification: &Notification) -> String {
    match notification.severity() {
        Severity::Info => format!("[info] {notification}"),
        Severity::Warning => format!("\x07[warning] {notification}"),
        Severity::Error => format!("[error] {notification}"),
    }
}
