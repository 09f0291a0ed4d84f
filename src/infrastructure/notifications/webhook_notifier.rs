use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, Notification, NotificationSink};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
  company_id: Uuid,
  #[serde(flatten)]
  notification: &'a Notification,
}

/// Posts each notification as JSON to a fixed URL.
pub struct WebhookNotifier {
  client: Client,
  url: String,
}

impl WebhookNotifier {
  pub fn new(url: impl Into<String>, timeout_seconds: u64) -> Result<Self, InvoiceError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(timeout_seconds))
      .build()
      .map_err(|e| InvoiceError::Notification(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      url: url.into(),
    })
  }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
  async fn notify(&self, company_id: Uuid, notification: Notification) -> Result<(), InvoiceError> {
    let payload = WebhookPayload {
      company_id,
      notification: &notification,
    };

    let response = self
      .client
      .post(&self.url)
      .json(&payload)
      .send()
      .await
      .map_err(|e| InvoiceError::Notification(format!("Webhook request failed: {}", e)))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(InvoiceError::Notification(format!(
        "Webhook returned status {}: {}",
        status, body
      )));
    }

    tracing::debug!(
      "Delivered notification '{}' for {}",
      notification.title,
      notification.source_id
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::Severity;

  fn notification() -> Notification {
    Notification {
      title: "Invoice paid".to_string(),
      message: "Invoice RE-2026-001 has been paid in full".to_string(),
      severity: Severity::Success,
      category: "invoice".to_string(),
      action_url: Some("/invoices/1".to_string()),
      target_user_id: None,
      source_type: "invoice".to_string(),
      source_id: Uuid::nil(),
    }
  }

  #[test]
  fn test_payload_is_flat() {
    let notification = notification();
    let payload = WebhookPayload {
      company_id: Uuid::nil(),
      notification: &notification,
    };
    let json = serde_json::to_value(&payload).unwrap();

    assert_eq!(json["company_id"], Uuid::nil().to_string());
    assert_eq!(json["title"], "Invoice paid");
    assert_eq!(json["severity"], "success");
    assert!(json["target_user_id"].is_null());
  }

  #[tokio::test]
  async fn test_unreachable_webhook_reports_notification_error() {
    // Reserve a port, then free it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let notifier = WebhookNotifier::new(format!("http://127.0.0.1:{}/hook", port), 2).unwrap();
    let result = notifier.notify(Uuid::new_v4(), notification()).await;

    assert!(matches!(result, Err(InvoiceError::Notification(_))));
  }
}
