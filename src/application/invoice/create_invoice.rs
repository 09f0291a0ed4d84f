use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::dto::{
  parse_line_items, parse_payment_terms, parse_status, InvoiceWithLineItemsResponse,
  LineItemCommand,
};
use crate::domain::invoice::{InvoiceData, InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceCommand {
  pub user_id: Uuid,
  pub company_id: Uuid,
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub payment_terms: Option<String>,
  pub status: Option<String>,
  pub notes: Option<String>,
  pub line_items: Vec<LineItemCommand>,
}

pub type CreateInvoiceResponse = InvoiceWithLineItemsResponse;

pub struct CreateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl CreateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: CreateInvoiceCommand,
  ) -> Result<CreateInvoiceResponse, InvoiceError> {
    let invoice_data = InvoiceData {
      customer_id: command.customer_id,
      issue_date: command.issue_date,
      due_date: command.due_date,
      payment_terms: parse_payment_terms(command.payment_terms)?,
      status: parse_status(command.status)?,
      notes: command.notes,
      line_items: parse_line_items(command.line_items)?,
    };

    let (invoice, line_items) = self
      .invoice_service
      .create_invoice(command.company_id, command.user_id, invoice_data)
      .await?;

    Ok(InvoiceWithLineItemsResponse::new(&invoice, &line_items))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::invoice::test_support::TestContext;
  use rust_decimal_macros::dec;

  #[tokio::test]
  async fn test_create_invoice_use_case() {
    let ctx = TestContext::new();
    let use_case = CreateInvoiceUseCase::new(ctx.service.clone());

    let response = use_case
      .execute(CreateInvoiceCommand {
        user_id: ctx.actor_id,
        company_id: ctx.company_id,
        customer_id: ctx.customer_id,
        issue_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        due_date: None,
        payment_terms: Some("net_10".to_string()),
        status: None,
        notes: None,
        line_items: vec![LineItemCommand {
          description: "Audit".to_string(),
          quantity: dec!(4),
          unit: Some("h".to_string()),
          unit_price: dec!(200),
          discount_percent: Some(dec!(25)),
        }],
      })
      .await
      .unwrap();

    assert_eq!(response.invoice.invoice_number, "RE-2026-001");
    assert_eq!(response.invoice.status, "draft");
    assert_eq!(response.invoice.due_date, NaiveDate::from_ymd_opt(2026, 6, 11).unwrap());
    assert_eq!(response.invoice.subtotal, dec!(600));
    assert_eq!(response.invoice.total_amount, dec!(648.6));
    assert_eq!(response.line_items[0].line_total, dec!(600));
    assert!(response.invoice.reference_code.is_some());
  }

  #[tokio::test]
  async fn test_create_invoice_rejects_unknown_terms() {
    let ctx = TestContext::new();
    let use_case = CreateInvoiceUseCase::new(ctx.service.clone());

    let result = use_case
      .execute(CreateInvoiceCommand {
        user_id: ctx.actor_id,
        company_id: ctx.company_id,
        customer_id: ctx.customer_id,
        issue_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        due_date: None,
        payment_terms: Some("whenever".to_string()),
        status: None,
        notes: None,
        line_items: vec![],
      })
      .await;

    assert!(matches!(result, Err(InvoiceError::Validation(_))));
  }
}
