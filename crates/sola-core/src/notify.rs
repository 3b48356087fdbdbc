//! Out-of-band notification seam.
//!
//! Desktop toast delivery itself lives outside this workspace; fronts plug
//! in their own implementation. The default just logs.

/// Trait for raising an out-of-band user notification.
pub trait Notifier: Send + Sync {
    /// Raises a notification with a short title and body.
    fn notify(&self, title: &str, body: &str);
}

/// Logs notifications through tracing instead of displaying them.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!("[Notify] {}: {}", title, body);
    }
}
