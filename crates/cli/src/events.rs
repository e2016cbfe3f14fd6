use shelf_http::{Notification, NotificationLevel, SessionEvents};
use tracing::debug;

/// Prints notifications to stderr, keeping stdout for command output
#[derive(Debug, Default, Clone, Copy)]
pub struct CliEvents;

impl SessionEvents for CliEvents {
    fn notify(&self, notification: Notification) {
        debug!(level = ?notification.level, message = %notification.message, "notification");
        match notification.level {
            NotificationLevel::Error => eprintln!("error: {notification}"),
            NotificationLevel::Warning => eprintln!("warning: {notification}"),
            NotificationLevel::Success | NotificationLevel::Info => eprintln!("{notification}"),
        }
    }

    fn redirect_to_login(&self) {
        eprintln!("Run `shelf login` to sign in again.");
    }
}
