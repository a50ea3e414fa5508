use std::time::Duration;

use tracing::{error, info, warn};

use crate::models::Group;

const TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Real-time rooms follow the user's group list. Fire and forget.
pub trait RoomPresence: Send + Sync {
    fn update_rooms(&self, groups: &[Group]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOptions {
    pub severity: Severity,
    pub duration: Duration,
}

impl NotifyOptions {
    pub fn success() -> Self {
        Self {
            severity: Severity::Success,
            duration: TOAST_DURATION,
        }
    }

    pub fn error() -> Self {
        Self {
            severity: Severity::Error,
            duration: TOAST_DURATION,
        }
    }
}

/// User-visible toasts. Fire and forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, options: NotifyOptions);
}

pub struct LogPresence;

impl RoomPresence for LogPresence {
    fn update_rooms(&self, groups: &[Group]) {
        let rooms: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        info!(?rooms, "rooms updated");
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, options: NotifyOptions) {
        match options.severity {
            Severity::Success | Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}
