use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::dto::parse_status;
use crate::domain::invoice::{InvoiceError, InvoiceFilter, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct ListInvoicesCommand {
  pub company_id: Uuid,
  pub status: Option<String>,
  pub customer_id: Option<Uuid>,
  pub search: Option<String>,
  #[serde(default)]
  pub overdue: bool,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListItemDto {
  pub id: Uuid,
  pub invoice_number: String,
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub status: String,
  pub total_amount: Decimal,
  pub paid_amount: Decimal,
  pub reference_code: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListInvoicesResponse {
  pub invoices: Vec<InvoiceListItemDto>,
}

pub struct ListInvoicesUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl ListInvoicesUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: ListInvoicesCommand,
  ) -> Result<ListInvoicesResponse, InvoiceError> {
    let filter = InvoiceFilter {
      status: parse_status(command.status)?,
      customer_id: command.customer_id,
      search: command.search,
      overdue: command.overdue,
    };

    let invoices = self
      .invoice_service
      .list_invoices(command.company_id, filter, Utc::now().date_naive())
      .await?;

    let invoices = invoices
      .into_iter()
      .map(|invoice| InvoiceListItemDto {
        id: invoice.id,
        invoice_number: invoice.invoice_number.into_inner(),
        customer_id: invoice.customer_id,
        issue_date: invoice.issue_date,
        due_date: invoice.due_date,
        status: invoice.status.as_str().to_string(),
        total_amount: invoice.total_amount.amount(),
        paid_amount: invoice.paid_amount.amount(),
        reference_code: invoice.reference_code.map(|r| r.into_inner()),
        created_at: invoice.created_at,
      })
      .collect();

    Ok(ListInvoicesResponse { invoices })
  }
}
