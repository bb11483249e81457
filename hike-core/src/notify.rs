//! User-visible, dismissable notifications.
//!
//! Absorbed failures and completed operations are reported through a
//! [`Notifier`] instead of being returned to the caller.

use parking_lot::Mutex;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        let description = n.description.as_deref().unwrap_or("");
        match n.level {
            Level::Error => tracing::error!(title = %n.title, "{description}"),
            Level::Info | Level::Success => tracing::info!(title = %n.title, "{description}"),
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.seen.lock().iter().filter(|n| n.level == level).count()
    }

    pub fn contains_title(&self, needle: &str) -> bool {
        self.seen.lock().iter().any(|n| n.title.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
