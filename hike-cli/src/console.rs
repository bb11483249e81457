use hike_core::{Level, LogNotifier, Notification, Notifier};
use std::sync::Arc;

/// Console output unless `quiet`, in which case notifications only reach the log.
pub fn notifier(quiet: bool) -> Arc<dyn Notifier> {
    if quiet {
        Arc::new(LogNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    }
}

/// Prints notifications to stderr, one line each.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", format_notification(&notification));
    }
}

fn format_notification(n: &Notification) -> String {
    let tag = match n.level {
        Level::Success => "ok",
        Level::Info => "info",
        Level::Error => "error",
    };
    match &n.description {
        Some(description) => format!("[{tag}] {}: {description}", n.title),
        None => format!("[{tag}] {}", n.title),
    }
}
