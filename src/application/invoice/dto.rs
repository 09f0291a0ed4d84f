use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::invoice::calculator::DEFAULT_UNIT;
use crate::domain::invoice::{
  DiscountPercent, Invoice, InvoiceError, InvoiceLineItem, InvoiceStatus, LineItemDescription,
  LineItemInput, Money, Payment, PaymentProgress, PaymentTerms, Quantity,
};

/// Line item as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemCommand {
  pub description: String,
  pub quantity: Decimal,
  pub unit: Option<String>,
  pub unit_price: Decimal,
  pub discount_percent: Option<Decimal>,
}

impl LineItemCommand {
  pub fn into_input(self) -> Result<LineItemInput, InvoiceError> {
    Ok(LineItemInput {
      description: LineItemDescription::new(self.description)?,
      quantity: Quantity::new(self.quantity)?,
      unit: self
        .unit
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
      unit_price: Money::new(self.unit_price)?,
      discount: self.discount_percent.map(DiscountPercent::new).transpose()?,
    })
  }
}

pub fn parse_line_items(items: Vec<LineItemCommand>) -> Result<Vec<LineItemInput>, InvoiceError> {
  items.into_iter().map(LineItemCommand::into_input).collect()
}

pub fn parse_payment_terms(terms: Option<String>) -> Result<Option<PaymentTerms>, InvoiceError> {
  Ok(terms.as_deref().map(PaymentTerms::from_str).transpose()?)
}

pub fn parse_status(status: Option<String>) -> Result<Option<InvoiceStatus>, InvoiceError> {
  Ok(status.as_deref().map(InvoiceStatus::from_str).transpose()?)
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDto {
  pub id: Uuid,
  pub company_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: String,
  pub status: String,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub paid_at: Option<DateTime<Utc>>,
  pub subtotal: Decimal,
  pub tax_amount: Decimal,
  pub total_amount: Decimal,
  pub paid_amount: Decimal,
  pub outstanding_amount: Decimal,
  pub payment_progress: PaymentProgress,
  pub reference_code: Option<String>,
  pub reference_formatted: Option<String>,
  pub notes: Option<String>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceDto {
  fn from(invoice: &Invoice) -> Self {
    Self {
      id: invoice.id,
      company_id: invoice.company_id,
      customer_id: invoice.customer_id,
      invoice_number: invoice.invoice_number.to_string(),
      status: invoice.status.as_str().to_string(),
      issue_date: invoice.issue_date,
      due_date: invoice.due_date,
      paid_at: invoice.paid_at,
      subtotal: invoice.subtotal.amount(),
      tax_amount: invoice.tax_amount.amount(),
      total_amount: invoice.total_amount.amount(),
      paid_amount: invoice.paid_amount.amount(),
      outstanding_amount: invoice.outstanding().amount(),
      payment_progress: invoice.payment_progress(),
      reference_code: invoice.reference_code.as_ref().map(|r| r.value().to_string()),
      reference_formatted: invoice.reference_code.as_ref().map(|r| r.formatted()),
      notes: invoice.notes.clone(),
      created_by: invoice.created_by,
      created_at: invoice.created_at,
      updated_at: invoice.updated_at,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceLineItemDto {
  pub id: Uuid,
  pub position: i32,
  pub description: String,
  pub quantity: Decimal,
  pub unit: String,
  pub unit_price: Decimal,
  pub discount_percent: Option<Decimal>,
  pub line_total: Decimal,
  pub tax_rate: Decimal,
  pub tax_amount: Decimal,
}

impl From<&InvoiceLineItem> for InvoiceLineItemDto {
  fn from(item: &InvoiceLineItem) -> Self {
    Self {
      id: item.id,
      position: item.position,
      description: item.description.value().to_string(),
      quantity: item.quantity.value(),
      unit: item.unit.clone(),
      unit_price: item.unit_price.amount(),
      discount_percent: item.discount.map(|d| d.value()),
      line_total: item.line_total.amount(),
      tax_rate: item.tax_rate.value(),
      tax_amount: item.tax_amount.amount(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDto {
  pub id: Uuid,
  pub payment_number: String,
  pub invoice_id: Uuid,
  pub amount: Decimal,
  pub payment_date: NaiveDate,
  pub reference: Option<String>,
  pub notes: Option<String>,
  pub created_by: Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentDto {
  fn from(payment: &Payment) -> Self {
    Self {
      id: payment.id,
      payment_number: payment.payment_number.to_string(),
      invoice_id: payment.invoice_id,
      amount: payment.amount.amount(),
      payment_date: payment.payment_date,
      reference: payment.reference.clone(),
      notes: payment.notes.clone(),
      created_by: payment.created_by,
      created_at: payment.created_at,
    }
  }
}

/// Invoice together with its current line items.
#[derive(Debug, Serialize)]
pub struct InvoiceWithLineItemsResponse {
  pub invoice: InvoiceDto,
  pub line_items: Vec<InvoiceLineItemDto>,
}

impl InvoiceWithLineItemsResponse {
  pub fn new(invoice: &Invoice, line_items: &[InvoiceLineItem]) -> Self {
    Self {
      invoice: InvoiceDto::from(invoice),
      line_items: line_items.iter().map(InvoiceLineItemDto::from).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  fn command(unit: Option<&str>, discount: Option<Decimal>) -> LineItemCommand {
    LineItemCommand {
      description: "  Support  ".to_string(),
      quantity: dec!(1.5),
      unit: unit.map(str::to_string),
      unit_price: dec!(80),
      discount_percent: discount,
    }
  }

  #[test]
  fn test_line_item_command_defaults_unit() {
    let input = command(None, None).into_input().unwrap();
    assert_eq!(input.unit, DEFAULT_UNIT);
    assert_eq!(input.description.value(), "Support");

    let input = command(Some(" "), None).into_input().unwrap();
    assert_eq!(input.unit, DEFAULT_UNIT);

    let input = command(Some("h"), Some(dec!(10))).into_input().unwrap();
    assert_eq!(input.unit, "h");
    assert_eq!(input.discount.unwrap().value(), dec!(10));
  }

  #[test]
  fn test_line_item_command_rejects_invalid_values() {
    assert!(command(None, Some(dec!(120))).into_input().is_err());

    let mut negative = command(None, None);
    negative.unit_price = dec!(-1);
    assert!(negative.into_input().is_err());
  }

  #[test]
  fn test_parse_optional_fields() {
    assert_eq!(
      parse_payment_terms(Some("net_10".to_string())).unwrap(),
      Some(PaymentTerms::Net10)
    );
    assert_eq!(parse_payment_terms(None).unwrap(), None);
    assert!(parse_status(Some("archived".to_string())).is_err());
    assert_eq!(
      parse_status(Some("Sent".to_string())).unwrap(),
      Some(InvoiceStatus::Sent)
    );
  }
}
