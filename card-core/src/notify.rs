//! User-visible status notifications.
//!
//! The editor never renders toasts itself; it hands [`Notification`]s to a
//! [`Notifier`] supplied by the host.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Visual treatment of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Error styling.
    Destructive,
}

/// A status message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Optional styling variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

impl Notification {
    /// Informational notification.
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: None,
        }
    }

    /// Error notification.
    #[must_use]
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Some(Variant::Destructive),
        }
    }

    /// Whether this is an error notification.
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.variant == Some(Variant::Destructive)
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Deliver a notification.
    fn notify(&self, notification: Notification);
}

/// Notifier that writes to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        if notification.is_destructive() {
            tracing::warn!("{}: {}", notification.title, notification.description);
        } else {
            tracing::info!("{}: {}", notification.title, notification.description);
        }
    }
}

/// Notifier that keeps every notification in memory.
///
/// Used by hosts that display notifications later, and by tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Titles received so far, in order.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.title)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
    }
}
