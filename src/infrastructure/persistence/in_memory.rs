//! In-memory implementations of the invoicing ports.
//!
//! Intended for tests and local development. One store implements every
//! repository so that counters can be seeded from the stored documents the
//! same way the PostgreSQL implementation does. Every write takes the lock
//! once, checks, draws its numbers and commits, so a rejected write changes
//! nothing.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration as StdDuration;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::domain::invoice::lifecycle;
use crate::domain::invoice::numbering::{highest_issued, REFERENCE_SEQUENCE_YEAR};
use crate::domain::invoice::ports::{ExpectedState, SweepAudit};
use crate::domain::invoice::{
  AuditRecord, Customer, CustomerRepository, Invoice, InvoiceDraft, InvoiceError, InvoiceFilter,
  InvoiceLineItem, InvoiceLineItemRepository, InvoiceNumber, InvoiceRepository, Notification,
  NotificationSink, Payment, PaymentDraft, PaymentNumber, PaymentRepository, ReferenceCode,
  SequenceKind, TimeEntry, TimeEntryRepository,
};

type SequenceKey = (Uuid, SequenceKind, i32);

#[derive(Debug, Default)]
struct State {
  invoices: HashMap<Uuid, Invoice>,
  line_items: HashMap<Uuid, Vec<InvoiceLineItem>>,
  payments: Vec<Payment>,
  customers: HashMap<Uuid, Customer>,
  time_entries: Vec<TimeEntry>,
  sequences: HashMap<SequenceKey, u64>,
  audit_log: Vec<AuditRecord>,
  fail_audit: bool,
}

impl State {
  fn ensure_unique_number(&self, invoice: &Invoice) -> Result<(), InvoiceError> {
    let taken = self.invoices.values().any(|existing| {
      existing.id != invoice.id
        && existing.company_id == invoice.company_id
        && existing.invoice_number == invoice.invoice_number
    });
    if taken {
      return Err(InvoiceError::InvoiceNumberAlreadyExists(
        invoice.invoice_number.to_string(),
      ));
    }
    Ok(())
  }

  /// The stored invoice must still be in the state the write was computed
  /// from.
  fn ensure_unchanged(&self, id: Uuid, expected: &ExpectedState) -> Result<(), InvoiceError> {
    match self.invoices.get(&id) {
      None => Err(InvoiceError::InvoiceNotFound(id)),
      Some(stored) if !expected.holds_for(stored) => Err(InvoiceError::ConcurrentModification(id)),
      Some(_) => Ok(()),
    }
  }

  fn reference_taken(&self, company_id: Uuid, reference: &ReferenceCode) -> bool {
    self
      .invoices
      .values()
      .any(|i| i.company_id == company_id && i.reference_code.as_ref() == Some(reference))
  }

  /// Highest number already issued, used when a counter is first touched.
  fn legacy_seed(&self, company_id: Uuid, kind: SequenceKind, year: i32) -> u64 {
    match kind {
      SequenceKind::Invoice => highest_issued(
        self
          .invoices
          .values()
          .filter(|i| i.company_id == company_id)
          .map(|i| i.invoice_number.value()),
        &InvoiceNumber::year_prefix(year),
      ),
      SequenceKind::Payment => highest_issued(
        self
          .payments
          .iter()
          .filter(|p| p.company_id == company_id)
          .map(|p| p.payment_number.value()),
        &PaymentNumber::year_prefix(year),
      ),
      SequenceKind::Reference => self
        .invoices
        .values()
        .filter(|i| i.company_id == company_id && i.reference_code.is_some())
        .count() as u64,
    }
  }

  /// Next counter value without consuming it.
  fn peek_next(&self, key: SequenceKey) -> u64 {
    let (company_id, kind, year) = key;
    let current = match self.sequences.get(&key) {
      Some(value) => *value,
      None => self.legacy_seed(company_id, kind, year),
    };
    current + 1
  }

  /// Next reference no other invoice of the company carries yet.
  fn next_free_reference(
    &self,
    company_id: Uuid,
    prefix: Option<&str>,
  ) -> (SequenceKey, u64, ReferenceCode) {
    let key = (company_id, SequenceKind::Reference, REFERENCE_SEQUENCE_YEAR);
    let mut counter = self.peek_next(key);
    loop {
      let reference = ReferenceCode::generate(counter, prefix);
      if !self.reference_taken(company_id, &reference) {
        return (key, counter, reference);
      }
      counter += 1;
    }
  }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
  state: RwLock<State>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn read(&self) -> Result<RwLockReadGuard<'_, State>, InvoiceError> {
    self
      .state
      .read()
      .map_err(|_| InvoiceError::Repository("lock poisoned".to_string()))
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, State>, InvoiceError> {
    self
      .state
      .write()
      .map_err(|_| InvoiceError::Repository("lock poisoned".to_string()))
  }

  /// Customers are owned elsewhere; this seeds them for tests and demos.
  pub fn add_customer(&self, customer: Customer) {
    if let Ok(mut state) = self.state.write() {
      state.customers.insert(customer.id, customer);
    }
  }

  pub fn add_time_entry(&self, entry: TimeEntry) {
    if let Ok(mut state) = self.state.write() {
      state.time_entries.push(entry);
    }
  }

  /// Stores an invoice as imported from an older system, bypassing the
  /// counters.
  pub fn add_invoice(&self, invoice: Invoice) {
    if let Ok(mut state) = self.state.write() {
      state.invoices.insert(invoice.id, invoice);
    }
  }

  /// Makes every following audit write fail until switched off again.
  pub fn fail_audit_writes(&self, fail: bool) {
    if let Ok(mut state) = self.state.write() {
      state.fail_audit = fail;
    }
  }

  pub fn audit_records(&self) -> Vec<AuditRecord> {
    self
      .state
      .read()
      .map(|state| state.audit_log.clone())
      .unwrap_or_default()
  }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, InvoiceError> {
    Ok(self.read()?.customers.get(&id).cloned())
  }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
  async fn create(
    &self,
    draft: InvoiceDraft,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let mut state = self.write()?;
    if !state.customers.contains_key(&draft.customer_id) {
      return Err(InvoiceError::CustomerNotFound(draft.customer_id));
    }

    let number_key = (draft.company_id, SequenceKind::Invoice, draft.numbering_year());
    let sequence = state.peek_next(number_key);
    let (reference_key, counter, reference) =
      state.next_free_reference(draft.company_id, draft.reference_prefix.as_deref());

    let (invoice, line_items) = draft.into_invoice(sequence, Some(reference))?;
    state.ensure_unique_number(&invoice)?;

    state.sequences.insert(number_key, sequence);
    state.sequences.insert(reference_key, counter);
    state.invoices.insert(invoice.id, invoice.clone());
    state.line_items.insert(invoice.id, line_items.clone());
    Ok((invoice, line_items))
  }

  async fn update(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
  ) -> Result<Invoice, InvoiceError> {
    let mut state = self.write()?;
    state.ensure_unchanged(invoice.id, &expected)?;
    state.invoices.insert(invoice.id, invoice.clone());
    Ok(invoice)
  }

  async fn update_with_line_items(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
    line_items: Vec<InvoiceLineItem>,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let mut state = self.write()?;
    state.ensure_unchanged(invoice.id, &expected)?;
    state.invoices.insert(invoice.id, invoice.clone());
    state.line_items.insert(invoice.id, line_items.clone());
    Ok((invoice, line_items))
  }

  async fn record_payment(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
    payment: PaymentDraft,
  ) -> Result<(Invoice, Payment), InvoiceError> {
    let mut state = self.write()?;
    state.ensure_unchanged(invoice.id, &expected)?;

    let key = (invoice.company_id, SequenceKind::Payment, payment.numbering_year());
    let sequence = state.peek_next(key);
    let payment = payment.into_payment(&invoice, sequence);

    state.sequences.insert(key, sequence);
    state.payments.push(payment.clone());
    state.invoices.insert(invoice.id, invoice.clone());
    Ok((invoice, payment))
  }

  async fn assign_reference(
    &self,
    invoice_id: Uuid,
    reference_prefix: Option<&str>,
  ) -> Result<Option<Invoice>, InvoiceError> {
    let mut state = self.write()?;
    let company_id = match state.invoices.get(&invoice_id) {
      None => return Err(InvoiceError::InvoiceNotFound(invoice_id)),
      Some(stored) if stored.reference_code.is_some() => return Ok(None),
      Some(stored) => stored.company_id,
    };

    let (key, counter, reference) = state.next_free_reference(company_id, reference_prefix);
    let Some(invoice) = state.invoices.get_mut(&invoice_id) else {
      return Err(InvoiceError::InvoiceNotFound(invoice_id));
    };
    invoice.assign_reference(reference);
    let invoice = invoice.clone();
    state.sequences.insert(key, counter);
    Ok(Some(invoice))
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    Ok(self.read()?.invoices.get(&id).cloned())
  }

  async fn search(
    &self,
    company_id: Uuid,
    filter: &InvoiceFilter,
    today: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let state = self.read()?;
    let mut invoices: Vec<Invoice> = state
      .invoices
      .values()
      .filter(|i| i.company_id == company_id && filter.matches(i, today))
      .cloned()
      .collect();
    invoices.sort_by(|a, b| b.invoice_number.value().cmp(a.invoice_number.value()));
    Ok(invoices)
  }

  async fn find_missing_reference(&self, company_id: Uuid) -> Result<Vec<Invoice>, InvoiceError> {
    let state = self.read()?;
    let mut invoices: Vec<Invoice> = state
      .invoices
      .values()
      .filter(|i| i.company_id == company_id && i.reference_code.is_none())
      .cloned()
      .collect();
    invoices.sort_by_key(|i| i.created_at);
    Ok(invoices)
  }

  async fn mark_overdue(
    &self,
    company_id: Uuid,
    today: NaiveDate,
    audit: Option<SweepAudit>,
  ) -> Result<Vec<Uuid>, InvoiceError> {
    let mut state = self.write()?;
    let invoice_ids: Vec<Uuid> = state
      .invoices
      .values()
      .filter(|i| i.company_id == company_id)
      .filter(|i| lifecycle::is_past_due(i.status, i.due_date, today))
      .map(|i| i.id)
      .collect();
    if invoice_ids.is_empty() {
      return Ok(invoice_ids);
    }

    if let Some(audit) = audit {
      if state.fail_audit {
        return Err(InvoiceError::Audit("audit log unavailable".to_string()));
      }
      let record = audit.record(company_id, today, &invoice_ids);
      state.audit_log.push(record);
    }
    for id in &invoice_ids {
      if let Some(invoice) = state.invoices.get_mut(id) {
        invoice.mark_overdue(today);
      }
    }
    Ok(invoice_ids)
  }

  async fn delete(&self, id: Uuid) -> Result<(), InvoiceError> {
    let mut state = self.write()?;
    let stored = state
      .invoices
      .get(&id)
      .ok_or(InvoiceError::InvoiceNotFound(id))?;
    stored.ensure_deletable()?;
    state.line_items.remove(&id);
    state.invoices.remove(&id);
    Ok(())
  }
}

#[async_trait]
impl InvoiceLineItemRepository for InMemoryStore {
  async fn find_by_invoice_id(
    &self,
    invoice_id: Uuid,
  ) -> Result<Vec<InvoiceLineItem>, InvoiceError> {
    let mut items = self
      .read()?
      .line_items
      .get(&invoice_id)
      .cloned()
      .unwrap_or_default();
    items.sort_by_key(|item| item.position);
    Ok(items)
  }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
  async fn find_by_invoice_id(&self, invoice_id: Uuid) -> Result<Vec<Payment>, InvoiceError> {
    Ok(
      self
        .read()?
        .payments
        .iter()
        .filter(|p| p.invoice_id == invoice_id)
        .cloned()
        .collect(),
    )
  }
}

#[async_trait]
impl TimeEntryRepository for InMemoryStore {
  async fn find_billable(
    &self,
    company_id: Uuid,
    project_id: Option<Uuid>,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TimeEntry>, InvoiceError> {
    Ok(
      self
        .read()?
        .time_entries
        .iter()
        .filter(|e| e.company_id == company_id && e.billable)
        .filter(|e| project_id.is_none() || e.project_id == project_id)
        .filter(|e| e.work_date >= from && e.work_date <= to)
        .cloned()
        .collect(),
    )
  }
}

/// Keeps every notification; optionally fails or delays each delivery.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
  notifications: Mutex<Vec<Notification>>,
  recorded: Notify,
  fail: bool,
  delay: Option<StdDuration>,
}

impl RecordingNotificationSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Self::default()
    }
  }

  pub fn delayed(delay: StdDuration) -> Self {
    Self {
      delay: Some(delay),
      ..Self::default()
    }
  }

  pub fn notifications(&self) -> Vec<Notification> {
    self
      .notifications
      .lock()
      .map(|n| n.clone())
      .unwrap_or_default()
  }

  /// Waits up to a second for `count` deliveries, then returns what arrived.
  pub async fn wait_for(&self, count: usize) -> Vec<Notification> {
    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(1);
    loop {
      let recorded = self.recorded.notified();
      let current = self.notifications();
      if current.len() >= count {
        return current;
      }
      if tokio::time::timeout_at(deadline, recorded).await.is_err() {
        return self.notifications();
      }
    }
  }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
  async fn notify(
    &self,
    _company_id: Uuid,
    notification: Notification,
  ) -> Result<(), InvoiceError> {
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if self.fail {
      return Err(InvoiceError::Notification("delivery refused".to_string()));
    }
    self
      .notifications
      .lock()
      .map_err(|_| InvoiceError::Notification("lock poisoned".to_string()))?
      .push(notification);
    self.recorded.notify_waiters();
    Ok(())
  }
}
