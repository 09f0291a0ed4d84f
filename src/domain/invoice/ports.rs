use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::entities::{Customer, Invoice, InvoiceDraft, InvoiceLineItem, Payment, PaymentDraft};
use super::errors::InvoiceError;
use super::time_entries::TimeEntry;
use super::value_objects::{InvoiceStatus, Money};

pub const AUDIT_MODULE: &str = "invoicing";
pub const INVOICE_ENTITY: &str = "invoice";

/// Criteria for listing invoices. Empty fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceFilter {
  pub status: Option<InvoiceStatus>,
  pub customer_id: Option<Uuid>,
  /// Case-insensitive match on number, notes or reference. References also
  /// match in their printed grouping.
  pub search: Option<String>,
  pub overdue: bool,
}

impl InvoiceFilter {
  pub fn matches(&self, invoice: &Invoice, today: NaiveDate) -> bool {
    if self.status.is_some_and(|status| invoice.status != status) {
      return false;
    }
    if self
      .customer_id
      .is_some_and(|customer_id| invoice.customer_id != customer_id)
    {
      return false;
    }
    if self.overdue && !invoice.is_overdue(today) {
      return false;
    }
    match self.search.as_deref().map(str::trim) {
      Some(term) if !term.is_empty() => {
        let term = term.to_lowercase();
        let compact = without_whitespace(&term);
        invoice.invoice_number.value().to_lowercase().contains(&term)
          || invoice
            .notes
            .as_deref()
            .is_some_and(|notes| notes.to_lowercase().contains(&term))
          || invoice
            .reference_code
            .as_ref()
            .is_some_and(|reference| !compact.is_empty() && reference.value().contains(&compact))
      }
      _ => true,
    }
  }
}

/// References are stored without the spaces of their print form.
pub fn without_whitespace(term: &str) -> String {
  term.chars().filter(|c| !c.is_whitespace()).collect()
}

/// State a write was computed from. Stores apply the write only while the
/// stored invoice still has this status and paid amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedState {
  pub status: InvoiceStatus,
  pub paid_amount: Money,
}

impl ExpectedState {
  pub fn of(invoice: &Invoice) -> Self {
    Self {
      status: invoice.status,
      paid_amount: invoice.paid_amount,
    }
  }

  pub fn holds_for(&self, stored: &Invoice) -> bool {
    stored.status == self.status && stored.paid_amount == self.paid_amount
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Success,
  Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
  pub title: String,
  pub message: String,
  pub severity: Severity,
  pub category: String,
  pub action_url: Option<String>,
  pub target_user_id: Option<Uuid>,
  pub source_type: String,
  pub source_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
  pub company_id: Uuid,
  pub actor_id: Uuid,
  pub module: String,
  pub entity_type: String,
  pub action: String,
  pub description: String,
  pub metadata: serde_json::Value,
  pub retention_until: DateTime<Utc>,
}

/// Who ran an overdue sweep. The store writes the resulting audit record in
/// the same transaction as the status change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepAudit {
  pub actor_id: Uuid,
  pub retention_until: DateTime<Utc>,
}

impl SweepAudit {
  pub fn record(&self, company_id: Uuid, today: NaiveDate, invoice_ids: &[Uuid]) -> AuditRecord {
    AuditRecord {
      company_id,
      actor_id: self.actor_id,
      module: AUDIT_MODULE.to_string(),
      entity_type: INVOICE_ENTITY.to_string(),
      action: "overdue_sweep".to_string(),
      description: format!("Marked {} invoice(s) as overdue", invoice_ids.len()),
      metadata: json!({
        "count": invoice_ids.len(),
        "invoice_ids": invoice_ids,
        "as_of": today,
      }),
      retention_until: self.retention_until,
    }
  }
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, InvoiceError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
  /// Draws the invoice number and a free reference, then inserts the invoice
  /// and its line items, all in one transaction.
  async fn create(
    &self,
    draft: InvoiceDraft,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError>;
  /// Stores everything except the balance. Fails with
  /// `ConcurrentModification` unless the stored invoice still matches
  /// `expected`.
  async fn update(&self, invoice: Invoice, expected: ExpectedState)
  -> Result<Invoice, InvoiceError>;
  /// Like `update`, and replaces all of the line items in one transaction.
  async fn update_with_line_items(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
    line_items: Vec<InvoiceLineItem>,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError>;
  /// Stores the new balance, draws the payment number and appends the
  /// payment in one transaction. Fails with `ConcurrentModification` unless
  /// the stored invoice still matches `expected`.
  async fn record_payment(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
    payment: PaymentDraft,
  ) -> Result<(Invoice, Payment), InvoiceError>;
  /// Gives an invoice without reference the next free one. Returns `None`
  /// when the invoice already has a reference.
  async fn assign_reference(
    &self,
    invoice_id: Uuid,
    reference_prefix: Option<&str>,
  ) -> Result<Option<Invoice>, InvoiceError>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError>;
  /// Ordered by invoice number, newest first.
  async fn search(
    &self,
    company_id: Uuid,
    filter: &InvoiceFilter,
    today: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError>;
  /// Invoices without a structured reference, oldest first.
  async fn find_missing_reference(&self, company_id: Uuid) -> Result<Vec<Invoice>, InvoiceError>;
  /// Moves every sent or partial invoice due before `today` to overdue and
  /// returns the ids that changed. When something changed and `audit` is
  /// given, its record is written in the same transaction.
  async fn mark_overdue(
    &self,
    company_id: Uuid,
    today: NaiveDate,
    audit: Option<SweepAudit>,
  ) -> Result<Vec<Uuid>, InvoiceError>;
  /// Removes a draft without payments together with its line items. The
  /// delete guard is checked again against the locked row.
  async fn delete(&self, id: Uuid) -> Result<(), InvoiceError>;
}

#[async_trait]
pub trait InvoiceLineItemRepository: Send + Sync {
  async fn find_by_invoice_id(&self, invoice_id: Uuid)
  -> Result<Vec<InvoiceLineItem>, InvoiceError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
  async fn find_by_invoice_id(&self, invoice_id: Uuid) -> Result<Vec<Payment>, InvoiceError>;
}

#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
  /// Billable entries with `from <= work_date <= to`.
  async fn find_billable(
    &self,
    company_id: Uuid,
    project_id: Option<Uuid>,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TimeEntry>, InvoiceError>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn notify(&self, company_id: Uuid, notification: Notification)
  -> Result<(), InvoiceError>;
}

