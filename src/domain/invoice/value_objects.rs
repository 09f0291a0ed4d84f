use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid invoice number: {0}")]
  InvalidInvoiceNumber(String),
  #[error("Invalid payment number: {0}")]
  InvalidPaymentNumber(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Invalid line item description: {0}")]
  InvalidDescription(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid discount: {0}")]
  InvalidDiscount(String),
  #[error("Invalid VAT rate: {0}")]
  InvalidVatRate(String),
  #[error("Invalid payment terms: {0}")]
  InvalidPaymentTerms(String),
  #[error("Invalid invoice status: {0}")]
  InvalidStatus(String),
  #[error("Invalid reference code: {0}")]
  InvalidReference(String),
}

// Invoice Number - RE-{year}-{seq:03}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
  pub const PREFIX: &'static str = "RE";

  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 100 {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot exceed 100 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn compose(year: i32, sequence: u64) -> Self {
    Self(format!("{}-{}-{:03}", Self::PREFIX, year, sequence))
  }

  /// Prefix shared by all numbers of one year, e.g. `RE-2026-`.
  pub fn year_prefix(year: i32) -> String {
    format!("{}-{}-", Self::PREFIX, year)
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for InvoiceNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Payment Number - ZE-{year}-{seq:05}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNumber(String);

impl PaymentNumber {
  pub const PREFIX: &'static str = "ZE";

  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidPaymentNumber(
        "Payment number cannot be empty".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn compose(year: i32, sequence: u64) -> Self {
    Self(format!("{}-{}-{:05}", Self::PREFIX, year, sequence))
  }

  pub fn year_prefix(year: i32) -> String {
    format!("{}-{}-", Self::PREFIX, year)
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for PaymentNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Parses the trailing numeric segment of a document number (`RE-2026-042` -> 42).
pub fn trailing_sequence(number: &str) -> Option<u64> {
  number.rsplit('-').next()?.parse::<u64>().ok()
}

// Invoice Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
  Draft,
  Sent,
  Partial,
  Paid,
  Overdue,
  Cancelled,
}

impl InvoiceStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
  }

  pub fn is_editable(&self) -> bool {
    !matches!(self, InvoiceStatus::Paid)
  }

  /// Statuses the overdue sweep picks up.
  pub fn is_awaiting_payment(&self) -> bool {
    matches!(self, InvoiceStatus::Sent | InvoiceStatus::Partial)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      InvoiceStatus::Draft => "draft",
      InvoiceStatus::Sent => "sent",
      InvoiceStatus::Partial => "partial",
      InvoiceStatus::Paid => "paid",
      InvoiceStatus::Overdue => "overdue",
      InvoiceStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for InvoiceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for InvoiceStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "draft" => Ok(InvoiceStatus::Draft),
      "sent" => Ok(InvoiceStatus::Sent),
      "partial" => Ok(InvoiceStatus::Partial),
      "paid" => Ok(InvoiceStatus::Paid),
      "overdue" => Ok(InvoiceStatus::Overdue),
      "cancelled" => Ok(InvoiceStatus::Cancelled),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown status: {}",
        s
      ))),
    }
  }
}

// Money - non-negative fixed-point amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
  pub const ZERO: Money = Money(Decimal::ZERO);

  pub fn new(amount: Decimal) -> Result<Self, ValueObjectError> {
    if amount.is_sign_negative() && !amount.is_zero() {
      return Err(ValueObjectError::InvalidAmount(
        "Amount cannot be negative".to_string(),
      ));
    }
    Ok(Self(amount))
  }

  pub fn amount(&self) -> Decimal {
    self.0
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_zero()
  }

  pub fn add(&self, other: &Money) -> Result<Money, ValueObjectError> {
    self
      .0
      .checked_add(other.0)
      .map(Money)
      .ok_or_else(|| ValueObjectError::InvalidAmount("Amount out of range".to_string()))
  }

  /// Difference clamped at zero, e.g. the outstanding balance.
  pub fn saturating_sub(&self, other: &Money) -> Money {
    if other.0 >= self.0 {
      Money::ZERO
    } else {
      Money(self.0 - other.0)
    }
  }

  pub fn multiply(&self, factor: Decimal) -> Result<Money, ValueObjectError> {
    self
      .0
      .checked_mul(factor)
      .ok_or_else(|| ValueObjectError::InvalidAmount("Amount out of range".to_string()))
      .and_then(Money::new)
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "CHF {:.2}", self.0)
  }
}

// Payment Terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTerms {
  DueOnReceipt,
  Net10,
  Net30,
  Net60,
  Custom(i32),
}

impl PaymentTerms {
  pub fn days(&self) -> i32 {
    match self {
      PaymentTerms::DueOnReceipt => 0,
      PaymentTerms::Net10 => 10,
      PaymentTerms::Net30 => 30,
      PaymentTerms::Net60 => 60,
      PaymentTerms::Custom(days) => *days,
    }
  }

  pub fn as_str(&self) -> String {
    match self {
      PaymentTerms::DueOnReceipt => "due_on_receipt".to_string(),
      PaymentTerms::Net10 => "net_10".to_string(),
      PaymentTerms::Net30 => "net_30".to_string(),
      PaymentTerms::Net60 => "net_60".to_string(),
      PaymentTerms::Custom(days) => format!("custom_{}", days),
    }
  }
}

impl FromStr for PaymentTerms {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "due_on_receipt" => Ok(PaymentTerms::DueOnReceipt),
      "net_10" => Ok(PaymentTerms::Net10),
      "net_30" => Ok(PaymentTerms::Net30),
      "net_60" => Ok(PaymentTerms::Net60),
      s if s.starts_with("custom_") => {
        let days_str = s.strip_prefix("custom_").ok_or_else(|| {
          ValueObjectError::InvalidPaymentTerms(format!("Invalid custom terms: {}", s))
        })?;
        let days = days_str.parse::<i32>().map_err(|_| {
          ValueObjectError::InvalidPaymentTerms(format!("Invalid custom days: {}", s))
        })?;
        if days < 0 {
          return Err(ValueObjectError::InvalidPaymentTerms(
            "Custom days must be non-negative".to_string(),
          ));
        }
        Ok(PaymentTerms::Custom(days))
      }
      _ => Err(ValueObjectError::InvalidPaymentTerms(format!(
        "Unknown payment terms: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for PaymentTerms {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PaymentTerms::DueOnReceipt => write!(f, "Due on Receipt"),
      PaymentTerms::Net10 => write!(f, "Net 10"),
      PaymentTerms::Net30 => write!(f, "Net 30"),
      PaymentTerms::Net60 => write!(f, "Net 60"),
      PaymentTerms::Custom(days) => write!(f, "Net {}", days),
    }
  }
}

// Line Item Description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDescription(String);

impl LineItemDescription {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 500 {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot exceed 500 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

// Quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value.is_sign_negative() && !value.is_zero() {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity cannot be negative".to_string(),
      ));
    }
    // Max 4 decimal places
    if value.normalize().scale() > 4 {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity cannot have more than 4 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

// Discount Percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
      return Err(ValueObjectError::InvalidDiscount(
        "Discount must be between 0 and 100".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }

  /// Share of the price that remains after the discount, `1 - d/100`.
  pub fn remaining_factor(&self) -> Decimal {
    (Decimal::ONE_HUNDRED - self.0) / Decimal::ONE_HUNDRED
  }
}

// VAT Rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(Decimal);

impl VatRate {
  pub const STANDARD: VatRate = VatRate(super::calculator::STANDARD_VAT_RATE);

  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
      return Err(ValueObjectError::InvalidVatRate(
        "VAT rate must be between 0 and 100".to_string(),
      ));
    }
    // Max 2 decimal places
    if value.normalize().scale() > 2 {
      return Err(ValueObjectError::InvalidVatRate(
        "VAT rate cannot have more than 2 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }

  pub fn as_multiplier(&self) -> Decimal {
    self.0 / Decimal::ONE_HUNDRED
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_invoice_number_format() {
    assert_eq!(InvoiceNumber::compose(2026, 7).value(), "RE-2026-007");
    assert_eq!(InvoiceNumber::compose(2026, 1234).value(), "RE-2026-1234");
    assert_eq!(InvoiceNumber::year_prefix(2026), "RE-2026-");
    assert!(InvoiceNumber::new("".to_string()).is_err());
  }

  #[test]
  fn test_payment_number_format() {
    assert_eq!(PaymentNumber::compose(2026, 42).value(), "ZE-2026-00042");
    assert_eq!(PaymentNumber::year_prefix(2025), "ZE-2025-");
  }

  #[test]
  fn test_trailing_sequence() {
    assert_eq!(trailing_sequence("RE-2026-042"), Some(42));
    assert_eq!(trailing_sequence("ZE-2026-00100"), Some(100));
    assert_eq!(trailing_sequence("RE-2026-abc"), None);
  }

  #[test]
  fn test_invoice_status_round_trip_names() {
    for status in [
      InvoiceStatus::Draft,
      InvoiceStatus::Sent,
      InvoiceStatus::Partial,
      InvoiceStatus::Paid,
      InvoiceStatus::Overdue,
      InvoiceStatus::Cancelled,
    ] {
      assert_eq!(InvoiceStatus::from_str(status.as_str()).unwrap(), status);
    }
    assert!(InvoiceStatus::from_str("archived").is_err());
  }

  #[test]
  fn test_terminal_statuses() {
    assert!(InvoiceStatus::Paid.is_terminal());
    assert!(InvoiceStatus::Cancelled.is_terminal());
    assert!(!InvoiceStatus::Overdue.is_terminal());
    assert!(!InvoiceStatus::Paid.is_editable());
    assert!(InvoiceStatus::Cancelled.is_editable());
  }

  #[test]
  fn test_money() {
    assert_eq!(Money::new(dec!(100.50)).unwrap().amount(), dec!(100.50));
    assert!(Money::new(dec!(-10)).is_err());
    let a = Money::new(dec!(100)).unwrap();
    let b = Money::new(dec!(30)).unwrap();
    assert_eq!(a.add(&b).unwrap().amount(), dec!(130));
    assert_eq!(a.saturating_sub(&b).amount(), dec!(70));
    assert_eq!(b.saturating_sub(&a), Money::ZERO);
    assert_eq!(a.to_string(), "CHF 100.00");
  }

  #[test]
  fn test_quantity() {
    assert!(Quantity::new(dec!(0)).is_ok());
    assert!(Quantity::new(dec!(1.5)).is_ok());
    assert!(Quantity::new(dec!(-1)).is_err());
    assert!(Quantity::new(dec!(1.12345)).is_err());
  }

  #[test]
  fn test_discount() {
    assert!(DiscountPercent::new(dec!(0)).is_ok());
    assert!(DiscountPercent::new(dec!(100)).is_ok());
    assert!(DiscountPercent::new(dec!(100.01)).is_err());
    assert!(DiscountPercent::new(dec!(-0.5)).is_err());
    assert_eq!(
      DiscountPercent::new(dec!(15)).unwrap().remaining_factor(),
      dec!(0.85)
    );
  }

  #[test]
  fn test_vat_rate() {
    assert!(VatRate::new(dec!(8.1)).is_ok());
    assert!(VatRate::new(dec!(101)).is_err());
    assert!(VatRate::new(dec!(7.725)).is_err());
    assert_eq!(VatRate::new(dec!(8.1)).unwrap().as_multiplier(), dec!(0.081));
  }

  #[test]
  fn test_payment_terms() {
    assert_eq!(PaymentTerms::Net30.days(), 30);
    assert_eq!(
      PaymentTerms::from_str("custom_45").unwrap(),
      PaymentTerms::Custom(45)
    );
    assert!(PaymentTerms::from_str("custom_-3").is_err());
  }
}
