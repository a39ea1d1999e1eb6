//! Notifier that turns user-visible messages into log events.

use tracing::{error, warn};

use crate::contract::{Notifier, Severity};

/// Surfaces notifications through `tracing`, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => warn!(notice = %message, "Notice"),
            Severity::Error => error!(notice = %message, "Notice"),
        }
    }
}
