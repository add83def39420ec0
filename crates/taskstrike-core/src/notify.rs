//! Desktop notification delivery.
//!
//! Notifications are best-effort: delivery failures are logged and
//! swallowed, never surfaced to the timer.

use notify_rust::{Notification, Timeout};
use tracing::warn;

use crate::storage::Config;
use crate::timer::CompletionStatus;

/// Completion event consumer. Must never fail the caller.
pub trait Notifier {
    fn notify(&self, task_name: &str, status: Option<CompletionStatus>);
}

/// Desktop popup notifications via the platform notification service.
pub struct DesktopNotifier {
    enabled: bool,
    popup_secs: u32,
}

impl DesktopNotifier {
    pub fn new(enabled: bool, popup_secs: u32) -> Self {
        Self {
            enabled,
            popup_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.notifications.enabled,
            config.notifications.popup_duration,
        )
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, task_name: &str, status: Option<CompletionStatus>) {
        if !self.enabled {
            return;
        }
        let body = match status {
            Some(CompletionStatus::Finished) => format!("{task_name} - Time's up! Finished."),
            Some(CompletionStatus::NotFinished) => {
                format!("{task_name} - Time's up! Not finished.")
            }
            None => format!("{task_name} - Time's up!"),
        };
        let result = Notification::new()
            .summary("TaskStrike")
            .body(&body)
            .appname("taskstrike")
            .icon("alarm-clock")
            .timeout(Timeout::Milliseconds(self.popup_secs.saturating_mul(1000)))
            .show();
        if let Err(e) = result {
            warn!("desktop notification failed: {e}");
        }
    }
}
