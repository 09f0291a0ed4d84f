use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct DeleteInvoiceCommand {
  pub company_id: Uuid,
  pub invoice_id: Uuid,
}

pub struct DeleteInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl DeleteInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(&self, command: DeleteInvoiceCommand) -> Result<(), InvoiceError> {
    self
      .invoice_service
      .delete_invoice(command.company_id, command.invoice_id)
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::invoice::test_support::TestContext;
  use crate::domain::invoice::InvoiceStatus;

  #[tokio::test]
  async fn test_delete_draft() {
    let ctx = TestContext::new();
    let invoice = ctx.create_invoice().await;
    let use_case = DeleteInvoiceUseCase::new(ctx.service.clone());

    use_case
      .execute(DeleteInvoiceCommand {
        company_id: ctx.company_id,
        invoice_id: invoice.id,
      })
      .await
      .unwrap();

    let result = ctx.service.get_invoice(ctx.company_id, invoice.id).await;
    assert!(matches!(result, Err(InvoiceError::InvoiceNotFound(_))));
  }

  #[tokio::test]
  async fn test_delete_sent_invoice_rejected() {
    let ctx = TestContext::new();
    let invoice = ctx.create_invoice().await;
    ctx
      .service
      .send_invoice(ctx.company_id, invoice.id)
      .await
      .unwrap();
    let use_case = DeleteInvoiceUseCase::new(ctx.service.clone());

    let result = use_case
      .execute(DeleteInvoiceCommand {
        company_id: ctx.company_id,
        invoice_id: invoice.id,
      })
      .await;
    assert!(matches!(
      result,
      Err(InvoiceError::CannotDeleteInvoice(InvoiceStatus::Sent))
    ));
    assert!(ctx.service.get_invoice(ctx.company_id, invoice.id).await.is_ok());
  }

  #[tokio::test]
  async fn test_delete_in_other_company_is_not_found() {
    let ctx = TestContext::new();
    let invoice = ctx.create_invoice().await;
    let use_case = DeleteInvoiceUseCase::new(ctx.service.clone());

    let result = use_case
      .execute(DeleteInvoiceCommand {
        company_id: Uuid::new_v4(),
        invoice_id: invoice.id,
      })
      .await;
    assert!(matches!(result, Err(InvoiceError::InvoiceNotFound(_))));
    assert!(ctx.service.get_invoice(ctx.company_id, invoice.id).await.is_ok());
  }
}
