use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::value_objects::{InvoiceStatus, Money, ValueObjectError};

/// Coarse classification callers branch on (HTTP status, retries, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Validation,
  InvalidStateTransition,
  OverPayment,
  Conflict,
  Internal,
}

#[derive(Debug, Error)]
pub enum InvoiceError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Invoice not found: {0}")]
  InvoiceNotFound(Uuid),

  #[error("Customer not found: {0}")]
  CustomerNotFound(Uuid),

  #[error("No line items provided")]
  NoLineItems,

  #[error("No billable time entries between {from} and {to}")]
  NoBillableTimeEntries { from: NaiveDate, to: NaiveDate },

  #[error("Invalid amount: {0}")]
  InvalidAmount(String),

  #[error("Due date {due_date} is before issue date {issue_date}")]
  InvalidDates {
    issue_date: NaiveDate,
    due_date: NaiveDate,
  },

  #[error("New total {total} is below the amount already paid ({paid})")]
  TotalBelowPaidAmount { total: Money, paid: Money },

  #[error("Invalid status transition from {from} to {to}")]
  InvalidStatusTransition {
    from: InvoiceStatus,
    to: InvoiceStatus,
  },

  #[error("Cannot edit invoice in status {0}")]
  CannotEditInvoice(InvoiceStatus),

  #[error("Cannot cancel invoice with recorded payments ({paid})")]
  CannotCancelWithPayments { paid: Money },

  #[error("Only draft invoices can be deleted (status is {0}); cancel it instead")]
  CannotDeleteInvoice(InvoiceStatus),

  #[error("Cannot delete invoice with recorded payments ({paid})")]
  CannotDeleteWithPayments { paid: Money },

  #[error("Invoice in status {0} does not accept payments")]
  PaymentNotAccepted(InvoiceStatus),

  #[error("Payment of {amount} exceeds the outstanding balance of {outstanding}")]
  OverPayment { amount: Money, outstanding: Money },

  #[error("Invoice number '{0}' already exists")]
  InvoiceNumberAlreadyExists(String),

  #[error("Reference '{0}' is already used by another invoice")]
  ReferenceAlreadyExists(String),

  #[error("Invoice {0} was modified concurrently")]
  ConcurrentModification(Uuid),

  #[error("Audit error: {0}")]
  Audit(String),

  #[error("Notification error: {0}")]
  Notification(String),

  #[error("Repository error: {0}")]
  Repository(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl InvoiceError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      InvoiceError::InvoiceNotFound(_) | InvoiceError::CustomerNotFound(_) => ErrorKind::NotFound,
      InvoiceError::Validation(_)
      | InvoiceError::NoLineItems
      | InvoiceError::NoBillableTimeEntries { .. }
      | InvoiceError::InvalidAmount(_)
      | InvoiceError::InvalidDates { .. }
      | InvoiceError::TotalBelowPaidAmount { .. } => ErrorKind::Validation,
      InvoiceError::InvalidStatusTransition { .. }
      | InvoiceError::CannotEditInvoice(_)
      | InvoiceError::CannotCancelWithPayments { .. }
      | InvoiceError::CannotDeleteInvoice(_)
      | InvoiceError::CannotDeleteWithPayments { .. }
      | InvoiceError::PaymentNotAccepted(_) => ErrorKind::InvalidStateTransition,
      InvoiceError::OverPayment { .. } => ErrorKind::OverPayment,
      InvoiceError::InvoiceNumberAlreadyExists(_)
      | InvoiceError::ReferenceAlreadyExists(_)
      | InvoiceError::ConcurrentModification(_) => ErrorKind::Conflict,
      InvoiceError::Audit(_)
      | InvoiceError::Notification(_)
      | InvoiceError::Repository(_)
      | InvoiceError::Database(_)
      | InvoiceError::Internal(_) => ErrorKind::Internal,
    }
  }
}
