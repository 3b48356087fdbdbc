//! Proactive inbox policy.
//!
//! The backend may initiate conversation on its own ("proactive push").
//! This module decides which pushes warrant an out-of-band notification and
//! builds the truncated preview for it; appending the message itself is the
//! session layer's job.

use crate::conversation::truncate_chars;

/// Hard cap on notification preview length, in characters.
pub const NOTIFY_PREVIEW_MAX: usize = 100;

/// Reason tags that always trigger a notification.
const NOTIFY_REASONS: &[&str] = &["check_in", "reminder", "alert"];

/// What the session should do with one proactive push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushDisposition {
    /// Raise an out-of-band notification.
    pub notify: bool,
    /// Ellipsis-truncated preview for the notification body.
    pub preview: String,
}

/// Tracks per-session proactive push state.
///
/// The very first push of a session always notifies, regardless of reason,
/// so the user learns the backend has started talking.
#[derive(Debug, Default)]
pub struct ProactiveInbox {
    seen_any: bool,
}

impl ProactiveInbox {
    /// Creates an inbox that has seen no pushes yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies one push and records that it was seen.
    pub fn classify(&mut self, content: &str, reason: Option<&str>) -> PushDisposition {
        let first_push = !self.seen_any;
        self.seen_any = true;

        let reason_notifies = reason
            .map(|r| NOTIFY_REASONS.contains(&r))
            .unwrap_or(false);

        PushDisposition {
            notify: first_push || reason_notifies,
            preview: truncate_chars(content, NOTIFY_PREVIEW_MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_push_always_notifies() {
        let mut inbox = ProactiveInbox::new();
        let disposition = inbox.classify("hello from the backend", None);
        assert!(disposition.notify);
    }

    #[test]
    fn test_later_pushes_notify_only_for_known_reasons() {
        let mut inbox = ProactiveInbox::new();
        inbox.classify("first", None);

        assert!(!inbox.classify("musing", None).notify);
        assert!(!inbox.classify("musing", Some("ambient")).notify);
        assert!(inbox.classify("time for standup", Some("reminder")).notify);
        assert!(inbox.classify("cpu pegged", Some("alert")).notify);
        assert!(inbox.classify("how are you doing?", Some("check_in")).notify);
    }

    #[test]
    fn test_preview_is_capped_with_ellipsis() {
        let mut inbox = ProactiveInbox::new();
        let long = "a".repeat(250);
        let disposition = inbox.classify(&long, None);
        assert_eq!(disposition.preview.chars().count(), NOTIFY_PREVIEW_MAX + 1);
        assert!(disposition.preview.ends_with('…'));

        let short = inbox.classify("short", Some("reminder"));
        assert_eq!(short.preview, "short");
    }
}
