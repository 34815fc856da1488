//! User-facing notices raised by screen actions.

use crate::client::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A transient message for the user, shown as a dismissable toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind, title: title.into(), message: message.into() }
    }

    pub fn nothing_to_send() -> Self {
        Self::new(NoticeKind::Info, "Nothing to send", "Nothing to send.")
    }

    pub fn sent() -> Self {
        Self::new(NoticeKind::Success, "Sent", "Drawing sent.")
    }

    pub fn send_failed(error: &SyncError) -> Self {
        log::warn!("Send failed: {}", error);
        Self::new(NoticeKind::Error, "Error", "Could not send the drawing. Try again.")
    }

    pub fn cleared() -> Self {
        Self::new(NoticeKind::Success, "Cleared", "Drawing cleared.")
    }

    pub fn clear_failed(error: &SyncError) -> Self {
        log::warn!("Clear failed: {}", error);
        Self::new(NoticeKind::Error, "Error", "Could not clear the drawing. Try again.")
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}
