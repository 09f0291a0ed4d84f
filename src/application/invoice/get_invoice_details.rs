use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::dto::{InvoiceDto, InvoiceLineItemDto, PaymentDto};
use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct GetInvoiceDetailsCommand {
  pub company_id: Uuid,
  pub invoice_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailsResponse {
  pub invoice: InvoiceDto,
  pub line_items: Vec<InvoiceLineItemDto>,
  pub payments: Vec<PaymentDto>,
}

pub struct GetInvoiceDetailsUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GetInvoiceDetailsUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: GetInvoiceDetailsCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    let details = self
      .invoice_service
      .get_invoice(command.company_id, command.invoice_id)
      .await?;

    Ok(InvoiceDetailsResponse {
      invoice: InvoiceDto::from(&details.invoice),
      line_items: details.line_items.iter().map(InvoiceLineItemDto::from).collect(),
      payments: details.payments.iter().map(PaymentDto::from).collect(),
    })
  }
}
