use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::dto::{
  parse_line_items, parse_payment_terms, InvoiceWithLineItemsResponse, LineItemCommand,
};
use crate::domain::invoice::{InvoiceError, InvoiceService, InvoiceUpdateData};

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceCommand {
  pub company_id: Uuid,
  pub invoice_id: Uuid,
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub payment_terms: Option<String>,
  pub notes: Option<String>,
  pub line_items: Vec<LineItemCommand>,
}

pub struct UpdateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl UpdateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: UpdateInvoiceCommand,
  ) -> Result<InvoiceWithLineItemsResponse, InvoiceError> {
    let data = InvoiceUpdateData {
      customer_id: command.customer_id,
      issue_date: command.issue_date,
      due_date: command.due_date,
      payment_terms: parse_payment_terms(command.payment_terms)?,
      notes: command.notes,
      line_items: parse_line_items(command.line_items)?,
    };

    let (invoice, line_items) = self
      .invoice_service
      .update_invoice(command.company_id, command.invoice_id, data)
      .await?;

    Ok(InvoiceWithLineItemsResponse::new(&invoice, &line_items))
  }
}
