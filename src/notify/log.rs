use super::Notifier;
use crate::error::NotifyError;

/// Writes alerts to the log. Used when no delivery channel is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        tracing::warn!(target: "alert", alert = %text, "Alert (no delivery channel configured)");
        Ok(())
    }
}
