//! Invoice state machine.
//!
//! ```text
//! Draft ──send──▶ Sent ──payment settles──▶ Paid
//!   │              │  └──sweep (due < today)──▶ Overdue ──payment settles──▶ Paid
//!   │              └──cancel (nothing paid)──▶ Cancelled
//!   └──delete (draft, nothing paid)
//! ```
//!
//! Each guard is a separate function so callers and tests can check one rule
//! in isolation. Guards never mutate; the entity applies the resulting status.

use chrono::NaiveDate;

use super::errors::InvoiceError;
use super::value_objects::{InvoiceStatus, Money};

pub fn ensure_can_send(status: InvoiceStatus) -> Result<(), InvoiceError> {
  match status {
    InvoiceStatus::Paid | InvoiceStatus::Cancelled => Err(InvoiceError::InvalidStatusTransition {
      from: status,
      to: InvoiceStatus::Sent,
    }),
    _ => Ok(()),
  }
}

/// Only a draft moves to Sent; re-sending keeps the current status.
pub fn status_after_send(status: InvoiceStatus) -> InvoiceStatus {
  match status {
    InvoiceStatus::Draft => InvoiceStatus::Sent,
    other => other,
  }
}

pub fn ensure_can_cancel(status: InvoiceStatus, paid_amount: Money) -> Result<(), InvoiceError> {
  if status.is_terminal() {
    return Err(InvoiceError::InvalidStatusTransition {
      from: status,
      to: InvoiceStatus::Cancelled,
    });
  }
  if !paid_amount.is_zero() {
    return Err(InvoiceError::CannotCancelWithPayments { paid: paid_amount });
  }
  Ok(())
}

pub fn ensure_can_delete(status: InvoiceStatus, paid_amount: Money) -> Result<(), InvoiceError> {
  if status != InvoiceStatus::Draft {
    return Err(InvoiceError::CannotDeleteInvoice(status));
  }
  if !paid_amount.is_zero() {
    return Err(InvoiceError::CannotDeleteWithPayments { paid: paid_amount });
  }
  Ok(())
}

pub fn ensure_editable(status: InvoiceStatus) -> Result<(), InvoiceError> {
  if !status.is_editable() {
    return Err(InvoiceError::CannotEditInvoice(status));
  }
  Ok(())
}

pub fn ensure_can_receive_payment(status: InvoiceStatus) -> Result<(), InvoiceError> {
  if status.is_terminal() {
    return Err(InvoiceError::PaymentNotAccepted(status));
  }
  Ok(())
}

/// Status once `paid_amount` has been raised by a payment. Partial payments
/// leave the status untouched; "partial" is never stamped automatically.
pub fn status_after_payment(
  status: InvoiceStatus,
  paid_amount: Money,
  total_amount: Money,
) -> InvoiceStatus {
  if paid_amount >= total_amount {
    InvoiceStatus::Paid
  } else {
    status
  }
}

/// Whether the overdue sweep should move an invoice. Dates are compared
/// as calendar days.
pub fn is_past_due(status: InvoiceStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
  status.is_awaiting_payment() && due_date < today
}

/// Statuses accepted at creation. Paid requires a zero total, since nothing
/// has been paid yet.
pub fn ensure_valid_initial_status(
  status: InvoiceStatus,
  total_amount: Money,
) -> Result<(), InvoiceError> {
  if status == InvoiceStatus::Paid && !total_amount.is_zero() {
    return Err(InvoiceError::InvalidStatusTransition {
      from: InvoiceStatus::Draft,
      to: InvoiceStatus::Paid,
    });
  }
  Ok(())
}
