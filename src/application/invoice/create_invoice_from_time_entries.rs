use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::dto::{parse_payment_terms, InvoiceWithLineItemsResponse};
use crate::domain::invoice::{InvoiceError, InvoiceService, TimeEntryInvoiceData};

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceFromTimeEntriesCommand {
  pub user_id: Uuid,
  pub company_id: Uuid,
  pub customer_id: Uuid,
  pub project_id: Option<Uuid>,
  pub from: NaiveDate,
  pub to: NaiveDate,
  pub issue_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub payment_terms: Option<String>,
  pub notes: Option<String>,
}

pub struct CreateInvoiceFromTimeEntriesUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl CreateInvoiceFromTimeEntriesUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: CreateInvoiceFromTimeEntriesCommand,
  ) -> Result<InvoiceWithLineItemsResponse, InvoiceError> {
    let data = TimeEntryInvoiceData {
      customer_id: command.customer_id,
      project_id: command.project_id,
      from: command.from,
      to: command.to,
      issue_date: command.issue_date,
      due_date: command.due_date,
      payment_terms: parse_payment_terms(command.payment_terms)?,
      notes: command.notes,
    };

    let (invoice, line_items) = self
      .invoice_service
      .create_invoice_from_time_entries(command.company_id, command.user_id, data)
      .await?;

    Ok(InvoiceWithLineItemsResponse::new(&invoice, &line_items))
  }
}
