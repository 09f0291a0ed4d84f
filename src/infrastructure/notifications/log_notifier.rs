use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, Notification, NotificationSink};

/// Writes notifications to the log instead of delivering them.
pub struct LogNotifier;

impl LogNotifier {
  pub fn new() -> Self {
    Self
  }
}

impl Default for LogNotifier {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl NotificationSink for LogNotifier {
  async fn notify(&self, company_id: Uuid, notification: Notification) -> Result<(), InvoiceError> {
    tracing::info!(
      company_id = %company_id,
      source_id = %notification.source_id,
      severity = ?notification.severity,
      "{}: {}",
      notification.title,
      notification.message
    );
    Ok(())
  }
}
