use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::invoice::LineItemCommand;

/// One line of an invoice as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemRequest {
  #[validate(length(
    min = 1,
    max = 500,
    message = "Description must be between 1 and 500 characters"
  ))]
  pub description: String,

  pub quantity: Decimal,

  /// Defaults to "pcs"
  #[validate(length(max = 20, message = "Unit must be at most 20 characters"))]
  pub unit: Option<String>,

  pub unit_price: Decimal,

  /// Percentage between 0 and 100
  pub discount_percent: Option<Decimal>,
}

impl From<LineItemRequest> for LineItemCommand {
  fn from(request: LineItemRequest) -> Self {
    LineItemCommand {
      description: request.description,
      quantity: request.quantity,
      unit: request.unit,
      unit_price: request.unit_price,
      discount_percent: request.discount_percent,
    }
  }
}

/// Request for creating an invoice
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
  pub customer_id: Uuid,

  pub issue_date: NaiveDate,

  /// Derived from `payment_terms` when omitted
  pub due_date: Option<NaiveDate>,

  /// e.g. "net_30" or "custom_45"
  pub payment_terms: Option<String>,

  /// Initial status, draft when omitted
  pub status: Option<String>,

  #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
  pub notes: Option<String>,

  #[validate(
    length(min = 1, message = "At least one line item is required"),
    nested
  )]
  pub line_items: Vec<LineItemRequest>,
}

/// Request for replacing the contents of an editable invoice
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
  pub customer_id: Uuid,

  pub issue_date: NaiveDate,

  pub due_date: Option<NaiveDate>,

  pub payment_terms: Option<String>,

  #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
  pub notes: Option<String>,

  #[validate(
    length(min = 1, message = "At least one line item is required"),
    nested
  )]
  pub line_items: Vec<LineItemRequest>,
}

/// Request for invoicing billable time entries of a period
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceFromTimeEntriesRequest {
  pub customer_id: Uuid,

  /// Restricts the entries to one project
  pub project_id: Option<Uuid>,

  pub from: NaiveDate,

  pub to: NaiveDate,

  pub issue_date: NaiveDate,

  pub due_date: Option<NaiveDate>,

  pub payment_terms: Option<String>,

  #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
  pub notes: Option<String>,
}

/// Request for recording an incoming payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentRequest {
  pub amount: Decimal,

  /// Today when omitted
  pub payment_date: Option<NaiveDate>,

  /// Bank or slip reference of the transfer
  #[validate(length(max = 255, message = "Reference must be at most 255 characters"))]
  pub reference: Option<String>,

  #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
  pub notes: Option<String>,
}

/// Query string for listing invoices
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListInvoicesQuery {
  pub status: Option<String>,
  pub customer_id: Option<Uuid>,
  pub search: Option<String>,
  pub overdue: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ValidateReferenceRequest {
  #[validate(length(
    min = 1,
    max = 64,
    message = "Reference must be between 1 and 64 characters"
  ))]
  pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateReferenceResponse {
  pub valid: bool,

  /// Grouped print form, only for valid references
  #[serde(skip_serializing_if = "Option::is_none")]
  pub formatted: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QrIbanCheckRequest {
  #[validate(length(min = 1, max = 64, message = "IBAN must be between 1 and 64 characters"))]
  pub iban: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrIbanCheckResponse {
  pub qr_iban: bool,
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,

  /// Human-readable error message
  pub message: String,

  /// Optional detailed error information
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

/// Generic success response
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
  pub message: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  fn line_item(description: &str) -> LineItemRequest {
    LineItemRequest {
      description: description.to_string(),
      quantity: dec!(1),
      unit: None,
      unit_price: dec!(100),
      discount_percent: None,
    }
  }

  fn create_request(line_items: Vec<LineItemRequest>) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
      customer_id: Uuid::new_v4(),
      issue_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
      due_date: None,
      payment_terms: None,
      status: None,
      notes: None,
      line_items,
    }
  }

  #[test]
  fn test_create_invoice_request_validation() {
    assert!(create_request(vec![line_item("Consulting")]).validate().is_ok());
    assert!(create_request(vec![]).validate().is_err());
    assert!(create_request(vec![line_item("")]).validate().is_err());
  }

  #[test]
  fn test_empty_line_items_error_names_the_field() {
    let errors = create_request(vec![]).validate().unwrap_err();
    let field_errors = errors.field_errors();
    let line_items = field_errors.get("line_items").unwrap();
    assert_eq!(line_items[0].code, "length");
    assert_eq!(
      line_items[0].message.as_deref(),
      Some("At least one line item is required")
    );
    assert_eq!(line_items[0].params["min"], 1);
  }

  #[test]
  fn test_create_invoice_request_deserializes_decimals_from_json() {
    let json = r#"{
      "customer_id": "8f0b7c4e-3a51-4b5e-9a52-2f4f5d1e6a10",
      "issue_date": "2026-01-15",
      "payment_terms": "net_10",
      "line_items": [
        { "description": "Support", "quantity": "1.5", "unit_price": "80", "discount_percent": "10" }
      ]
    }"#;

    let request: CreateInvoiceRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.line_items[0].quantity, dec!(1.5));
    assert_eq!(request.line_items[0].discount_percent, Some(dec!(10)));
    assert_eq!(request.payment_terms.as_deref(), Some("net_10"));

    let command: LineItemCommand = request.line_items[0].clone().into();
    assert_eq!(command.unit_price, dec!(80));
  }
}
