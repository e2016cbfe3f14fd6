//! User-facing side effects of API calls
//!
//! The client never renders anything itself. Notifications and the
//! login redirect are handed to a [`SessionEvents`] sink supplied by the
//! front end.

use std::fmt;

/// Path of the login entry point
pub const LOGIN_ROUTE: &str = "/login";

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for notifications and navigation requests
#[cfg_attr(test, mockall::automock)]
pub trait SessionEvents: Send + Sync {
    /// Show a message to the user
    fn notify(&self, notification: Notification);

    /// The session is gone; send the user to the login page
    fn redirect_to_login(&self);
}

/// Logs everything through `tracing`; the default sink
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl SessionEvents for TracingEvents {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success | NotificationLevel::Info => {
                info!(message = %notification.message, "notification");
            }
            NotificationLevel::Warning => warn!(message = %notification.message, "notification"),
            NotificationLevel::Error => error!(message = %notification.message, "notification"),
        }
    }

    fn redirect_to_login(&self) {
        info!(route = LOGIN_ROUTE, "Session ended, login required");
    }
}

/// Navigates the browser window to the login page
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserEvents;

#[cfg(target_arch = "wasm32")]
impl SessionEvents for BrowserEvents {
    fn notify(&self, notification: Notification) {
        TracingEvents.notify(notification);
    }

    fn redirect_to_login(&self) {
        if let Some(window) = web_sys::window() {
            if window.location().set_href(LOGIN_ROUTE).is_err() {
                warn!("Failed to redirect to login page");
            }
        }
    }
}
