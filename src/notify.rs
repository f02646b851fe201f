//! Run outcome notification.

use tracing::info;

/// Receives the overall outcome of a run. Core components never consult it.
pub trait Notifier {
    async fn notify(&self, subject: &str, body: &str);
}

/// Emits notifications as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        info!(%subject, "{body}");
    }
}
