use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculator::{CalculatedLine, InvoiceCalculation, InvoiceTotals};
use super::errors::InvoiceError;
use super::lifecycle;
use super::reference::ReferenceCode;
use super::value_objects::{
  DiscountPercent, InvoiceNumber, InvoiceStatus, LineItemDescription, Money, PaymentNumber,
  Quantity, VatRate,
};

// Customer - only what invoicing needs to check ownership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub id: Uuid,
  pub company_id: Uuid,
  pub name: String,
  pub archived_at: Option<DateTime<Utc>>,
}

impl Customer {
  pub fn new(company_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      company_id,
      name: name.into(),
      archived_at: None,
    }
  }

  pub fn is_archived(&self) -> bool {
    self.archived_at.is_some()
  }
}

/// Balance view derived from the amounts, independent of the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProgress {
  Unpaid,
  PartiallyPaid,
  Settled,
}

/// Everything needed to open an invoice once number and reference are drawn.
#[derive(Debug, Clone)]
pub struct NewInvoice {
  pub company_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: InvoiceNumber,
  pub status: InvoiceStatus,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub totals: InvoiceTotals,
  pub reference_code: Option<ReferenceCode>,
  pub notes: Option<String>,
  pub created_by: Uuid,
}

/// A calculated invoice waiting for its number. The store draws the number
/// and the reference in the transaction that inserts it.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
  pub company_id: Uuid,
  pub customer_id: Uuid,
  pub status: InvoiceStatus,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub calculation: InvoiceCalculation,
  pub reference_prefix: Option<String>,
  pub notes: Option<String>,
  pub created_by: Uuid,
}

impl InvoiceDraft {
  pub fn numbering_year(&self) -> i32 {
    self.issue_date.year()
  }

  pub fn into_invoice(
    self,
    sequence: u64,
    reference_code: Option<ReferenceCode>,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let invoice = Invoice::new(NewInvoice {
      company_id: self.company_id,
      customer_id: self.customer_id,
      invoice_number: InvoiceNumber::compose(self.numbering_year(), sequence),
      status: self.status,
      issue_date: self.issue_date,
      due_date: self.due_date,
      totals: self.calculation.totals,
      reference_code,
      notes: self.notes,
      created_by: self.created_by,
    })?;
    let line_items = self
      .calculation
      .lines
      .into_iter()
      .map(|line| InvoiceLineItem::from_calculated(invoice.id, line))
      .collect();
    Ok((invoice, line_items))
  }
}

// Invoice - Main invoice document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id: Uuid,
  pub company_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: InvoiceNumber,
  pub status: InvoiceStatus,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub paid_at: Option<DateTime<Utc>>,
  pub subtotal: Money,
  pub tax_amount: Money,
  pub total_amount: Money,
  pub paid_amount: Money,
  pub reference_code: Option<ReferenceCode>,
  pub notes: Option<String>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Invoice {
  pub fn new(data: NewInvoice) -> Result<Self, InvoiceError> {
    ensure_dates(data.issue_date, data.due_date)?;
    lifecycle::ensure_valid_initial_status(data.status, data.totals.total)?;

    let now = Utc::now();
    let paid_at = (data.status == InvoiceStatus::Paid).then_some(now);

    Ok(Self {
      id: Uuid::new_v4(),
      company_id: data.company_id,
      customer_id: data.customer_id,
      invoice_number: data.invoice_number,
      status: data.status,
      issue_date: data.issue_date,
      due_date: data.due_date,
      paid_at,
      subtotal: data.totals.subtotal,
      tax_amount: data.totals.tax_amount,
      total_amount: data.totals.total,
      paid_amount: Money::ZERO,
      reference_code: data.reference_code,
      notes: data.notes,
      created_by: data.created_by,
      created_at: now,
      updated_at: now,
    })
  }

  /// Replaces the editable fields and the totals. Line items are replaced by
  /// the caller alongside.
  pub fn update(
    &mut self,
    customer_id: Uuid,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    notes: Option<String>,
    totals: InvoiceTotals,
  ) -> Result<(), InvoiceError> {
    lifecycle::ensure_editable(self.status)?;
    ensure_dates(issue_date, due_date)?;
    if totals.total < self.paid_amount {
      return Err(InvoiceError::TotalBelowPaidAmount {
        total: totals.total,
        paid: self.paid_amount,
      });
    }

    self.customer_id = customer_id;
    self.issue_date = issue_date;
    self.due_date = due_date;
    self.notes = notes;
    self.subtotal = totals.subtotal;
    self.tax_amount = totals.tax_amount;
    self.total_amount = totals.total;
    self.updated_at = Utc::now();

    Ok(())
  }

  pub fn send(&mut self) -> Result<(), InvoiceError> {
    lifecycle::ensure_can_send(self.status)?;
    self.status = lifecycle::status_after_send(self.status);
    self.updated_at = Utc::now();
    Ok(())
  }

  pub fn cancel(&mut self) -> Result<(), InvoiceError> {
    lifecycle::ensure_can_cancel(self.status, self.paid_amount)?;
    self.status = InvoiceStatus::Cancelled;
    self.updated_at = Utc::now();
    Ok(())
  }

  pub fn ensure_deletable(&self) -> Result<(), InvoiceError> {
    lifecycle::ensure_can_delete(self.status, self.paid_amount)
  }

  /// Raises `paid_amount`; settles the invoice once the total is covered.
  /// Nothing is changed when the payment is rejected.
  pub fn apply_payment(&mut self, amount: Money) -> Result<(), InvoiceError> {
    if amount.is_zero() {
      return Err(InvoiceError::InvalidAmount(
        "Payment amount must be greater than zero".to_string(),
      ));
    }
    lifecycle::ensure_can_receive_payment(self.status)?;

    let new_paid = self.paid_amount.add(&amount)?;
    if new_paid > self.total_amount {
      return Err(InvoiceError::OverPayment {
        amount,
        outstanding: self.outstanding(),
      });
    }

    let now = Utc::now();
    self.paid_amount = new_paid;
    self.status = lifecycle::status_after_payment(self.status, new_paid, self.total_amount);
    if self.status == InvoiceStatus::Paid {
      self.paid_at = Some(now);
    }
    self.updated_at = now;
    Ok(())
  }

  /// Returns whether the invoice moved to Overdue.
  pub fn mark_overdue(&mut self, today: NaiveDate) -> bool {
    if !lifecycle::is_past_due(self.status, self.due_date, today) {
      return false;
    }
    self.status = InvoiceStatus::Overdue;
    self.updated_at = Utc::now();
    true
  }

  /// References are assigned once and never replaced.
  pub fn assign_reference(&mut self, reference: ReferenceCode) -> bool {
    if self.reference_code.is_some() {
      return false;
    }
    self.reference_code = Some(reference);
    self.updated_at = Utc::now();
    true
  }

  pub fn outstanding(&self) -> Money {
    self.total_amount.saturating_sub(&self.paid_amount)
  }

  pub fn payment_progress(&self) -> PaymentProgress {
    if self.paid_amount.is_zero() && !self.total_amount.is_zero() {
      PaymentProgress::Unpaid
    } else if self.paid_amount < self.total_amount {
      PaymentProgress::PartiallyPaid
    } else {
      PaymentProgress::Settled
    }
  }

  /// Open and past its due date, whether or not the sweep has run yet.
  pub fn is_overdue(&self, today: NaiveDate) -> bool {
    matches!(
      self.status,
      InvoiceStatus::Sent | InvoiceStatus::Partial | InvoiceStatus::Overdue
    ) && self.due_date < today
  }
}

pub fn ensure_dates(issue_date: NaiveDate, due_date: NaiveDate) -> Result<(), InvoiceError> {
  if due_date < issue_date {
    return Err(InvoiceError::InvalidDates {
      issue_date,
      due_date,
    });
  }
  Ok(())
}

// Invoice Line Item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub position: i32,
  pub description: LineItemDescription,
  pub quantity: Quantity,
  pub unit: String,
  pub unit_price: Money,
  pub discount: Option<DiscountPercent>,
  pub line_total: Money,
  pub tax_rate: VatRate,
  pub tax_amount: Money,
}

impl InvoiceLineItem {
  pub fn from_calculated(invoice_id: Uuid, line: CalculatedLine) -> Self {
    Self {
      id: Uuid::new_v4(),
      invoice_id,
      position: line.position,
      description: line.input.description,
      quantity: line.input.quantity,
      unit: line.input.unit,
      unit_price: line.input.unit_price,
      discount: line.input.discount,
      line_total: line.line_total,
      tax_rate: line.tax_rate,
      tax_amount: line.tax_amount,
    }
  }
}

// Payment - append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
  pub id: Uuid,
  pub payment_number: PaymentNumber,
  pub company_id: Uuid,
  pub invoice_id: Uuid,
  pub customer_id: Uuid,
  pub amount: Money,
  pub payment_date: NaiveDate,
  pub reference: Option<String>,
  pub notes: Option<String>,
  pub created_by: Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

impl Payment {
  pub fn new(
    invoice: &Invoice,
    payment_number: PaymentNumber,
    amount: Money,
    payment_date: NaiveDate,
    reference: Option<String>,
    notes: Option<String>,
    created_by: Option<Uuid>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      payment_number,
      company_id: invoice.company_id,
      invoice_id: invoice.id,
      customer_id: invoice.customer_id,
      amount,
      payment_date,
      reference,
      notes,
      created_by,
      created_at: Utc::now(),
    }
  }
}

/// A validated payment waiting for its number.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
  pub amount: Money,
  pub payment_date: NaiveDate,
  pub reference: Option<String>,
  pub notes: Option<String>,
  pub created_by: Option<Uuid>,
}

impl PaymentDraft {
  pub fn numbering_year(&self) -> i32 {
    self.payment_date.year()
  }

  pub fn into_payment(self, invoice: &Invoice, sequence: u64) -> Payment {
    Payment::new(
      invoice,
      PaymentNumber::compose(self.numbering_year(), sequence),
      self.amount,
      self.payment_date,
      self.reference,
      self.notes,
      self.created_by,
    )
  }
}
