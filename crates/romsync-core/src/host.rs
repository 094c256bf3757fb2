//! The view hosting the player, as seen by the controller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A transient, user-visible message (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timeout_ms: u64,
}

impl Notification {
    pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// UI surface the controller reports to.
///
/// Implementations must be cheap and non-blocking; they are called from
/// inside the controller's async tasks.
pub trait PlayerHost: Send + Sync {
    fn notify(&self, notification: Notification);

    fn set_playing(&self, playing: bool);

    fn set_fullscreen(&self, fullscreen: bool);
}
