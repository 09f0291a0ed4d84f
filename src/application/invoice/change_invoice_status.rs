use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService};

/// Status changes a user can trigger directly. Paid and Overdue follow
/// from payments and the overdue sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
  Send,
  Cancel,
}

#[derive(Debug, Deserialize)]
pub struct ChangeInvoiceStatusCommand {
  pub company_id: Uuid,
  pub invoice_id: Uuid,
  pub action: StatusAction,
}

#[derive(Debug, Serialize)]
pub struct ChangeInvoiceStatusResponse {
  pub invoice_id: Uuid,
  pub invoice_number: String,
  pub status: String,
  pub updated_at: DateTime<Utc>,
}

pub struct ChangeInvoiceStatusUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl ChangeInvoiceStatusUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: ChangeInvoiceStatusCommand,
  ) -> Result<ChangeInvoiceStatusResponse, InvoiceError> {
    let invoice = match command.action {
      StatusAction::Send => {
        self
          .invoice_service
          .send_invoice(command.company_id, command.invoice_id)
          .await?
      }
      StatusAction::Cancel => {
        self
          .invoice_service
          .cancel_invoice(command.company_id, command.invoice_id)
          .await?
      }
    };

    Ok(ChangeInvoiceStatusResponse {
      invoice_id: invoice.id,
      invoice_number: invoice.invoice_number.into_inner(),
      status: invoice.status.as_str().to_string(),
      updated_at: invoice.updated_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::invoice::test_support::TestContext;

  #[tokio::test]
  async fn test_send_then_cancel() {
    let ctx = TestContext::new();
    let invoice = ctx.create_invoice().await;
    let use_case = ChangeInvoiceStatusUseCase::new(ctx.service.clone());

    let sent = use_case
      .execute(ChangeInvoiceStatusCommand {
        company_id: ctx.company_id,
        invoice_id: invoice.id,
        action: StatusAction::Send,
      })
      .await
      .unwrap();
    assert_eq!(sent.status, "sent");

    let cancelled = use_case
      .execute(ChangeInvoiceStatusCommand {
        company_id: ctx.company_id,
        invoice_id: invoice.id,
        action: StatusAction::Cancel,
      })
      .await
      .unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let resend = use_case
      .execute(ChangeInvoiceStatusCommand {
        company_id: ctx.company_id,
        invoice_id: invoice.id,
        action: StatusAction::Send,
      })
      .await;
    assert!(resend.is_err());
  }
}
