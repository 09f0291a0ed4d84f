mod log_notifier;
mod webhook_notifier;

pub use log_notifier::LogNotifier;
pub use webhook_notifier::WebhookNotifier;

use std::sync::Arc;

use crate::domain::invoice::{InvoiceError, NotificationSink};
use crate::infrastructure::config::NotificationsConfig;

/// Webhook delivery when a URL is configured, otherwise log only.
pub fn notification_sink(
  config: &NotificationsConfig,
) -> Result<Arc<dyn NotificationSink>, InvoiceError> {
  match config.webhook_url.as_deref().map(str::trim) {
    Some(url) if !url.is_empty() => {
      tracing::info!("Delivering notifications to webhook {}", url);
      Ok(Arc::new(WebhookNotifier::new(url, config.timeout_seconds)?))
    }
    _ => {
      tracing::debug!("No notification webhook configured, notifications are only logged");
      Ok(Arc::new(LogNotifier::new()))
    }
  }
}
