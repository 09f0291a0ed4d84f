use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::calculator::{self, LineItemInput};
use super::entities::{ensure_dates, Invoice, InvoiceDraft, InvoiceLineItem, Payment, PaymentDraft};
use super::errors::InvoiceError;
use super::lifecycle;
use super::ports::{
  CustomerRepository, ExpectedState, InvoiceFilter, InvoiceLineItemRepository, InvoiceRepository,
  Notification, NotificationSink, PaymentRepository, Severity, SweepAudit, TimeEntryRepository,
  INVOICE_ENTITY,
};
use super::time_entries;
use super::value_objects::{InvoiceStatus, Money, PaymentTerms, ValueObjectError, VatRate};

const NOTIFICATION_CATEGORY: &str = "invoicing";

/// Company-independent invoicing settings.
#[derive(Debug, Clone)]
pub struct InvoicingSettings {
  pub vat_rate: VatRate,
  pub default_hourly_rate: Money,
  pub default_payment_terms: PaymentTerms,
  /// Digits placed in front of the counter in generated references.
  pub reference_prefix: Option<String>,
  pub audit_retention_years: u32,
}

impl Default for InvoicingSettings {
  fn default() -> Self {
    Self {
      vat_rate: VatRate::STANDARD,
      default_hourly_rate: Money::ZERO,
      default_payment_terms: PaymentTerms::Net30,
      reference_prefix: None,
      audit_retention_years: 10,
    }
  }
}

pub struct InvoiceServiceDependencies {
  pub invoice_repo: Arc<dyn InvoiceRepository>,
  pub line_item_repo: Arc<dyn InvoiceLineItemRepository>,
  pub payment_repo: Arc<dyn PaymentRepository>,
  pub customer_repo: Arc<dyn CustomerRepository>,
  pub time_entry_repo: Arc<dyn TimeEntryRepository>,
  pub notifier: Arc<dyn NotificationSink>,
}

/// Invoice creation data
pub struct InvoiceData {
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  /// Takes precedence over `payment_terms`.
  pub due_date: Option<NaiveDate>,
  pub payment_terms: Option<PaymentTerms>,
  pub status: Option<InvoiceStatus>,
  pub notes: Option<String>,
  pub line_items: Vec<LineItemInput>,
}

/// Invoice update data; line items replace the existing ones
pub struct InvoiceUpdateData {
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub payment_terms: Option<PaymentTerms>,
  pub notes: Option<String>,
  pub line_items: Vec<LineItemInput>,
}

pub struct PaymentData {
  pub amount: Decimal,
  /// Defaults to today.
  pub payment_date: Option<NaiveDate>,
  pub reference: Option<String>,
  pub notes: Option<String>,
}

pub struct TimeEntryInvoiceData {
  pub customer_id: Uuid,
  pub project_id: Option<Uuid>,
  pub from: NaiveDate,
  pub to: NaiveDate,
  pub issue_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub payment_terms: Option<PaymentTerms>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InvoiceDetails {
  pub invoice: Invoice,
  pub line_items: Vec<InvoiceLineItem>,
  pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
  pub updated_count: usize,
  pub invoice_ids: Vec<Uuid>,
}

pub struct InvoiceService {
  invoice_repo: Arc<dyn InvoiceRepository>,
  line_item_repo: Arc<dyn InvoiceLineItemRepository>,
  payment_repo: Arc<dyn PaymentRepository>,
  customer_repo: Arc<dyn CustomerRepository>,
  time_entry_repo: Arc<dyn TimeEntryRepository>,
  notifier: Arc<dyn NotificationSink>,
  settings: InvoicingSettings,
}

impl InvoiceService {
  pub fn new(deps: InvoiceServiceDependencies, settings: InvoicingSettings) -> Self {
    Self {
      invoice_repo: deps.invoice_repo,
      line_item_repo: deps.line_item_repo,
      payment_repo: deps.payment_repo,
      customer_repo: deps.customer_repo,
      time_entry_repo: deps.time_entry_repo,
      notifier: deps.notifier,
      settings,
    }
  }

  pub fn settings(&self) -> &InvoicingSettings {
    &self.settings
  }

  pub async fn create_invoice(
    &self,
    company_id: Uuid,
    actor_id: Uuid,
    data: InvoiceData,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    if data.line_items.is_empty() {
      return Err(InvoiceError::NoLineItems);
    }
    self.verify_customer(company_id, data.customer_id).await?;

    let calculation = calculator::calculate(data.line_items, self.settings.vat_rate)?;
    let due_date = self.resolve_due_date(data.issue_date, data.due_date, data.payment_terms)?;
    ensure_dates(data.issue_date, due_date)?;
    let status = data.status.unwrap_or(InvoiceStatus::Draft);
    lifecycle::ensure_valid_initial_status(status, calculation.totals.total)?;

    let draft = InvoiceDraft {
      company_id,
      customer_id: data.customer_id,
      status,
      issue_date: data.issue_date,
      due_date,
      calculation,
      reference_prefix: self.settings.reference_prefix.clone(),
      notes: data.notes,
      created_by: actor_id,
    };
    let (invoice, line_items) = self.invoice_repo.create(draft).await?;

    info!(
      invoice_id = %invoice.id,
      invoice_number = %invoice.invoice_number,
      total = %invoice.total_amount.amount(),
      "Invoice created"
    );

    Ok((invoice, line_items))
  }

  pub async fn create_invoice_from_time_entries(
    &self,
    company_id: Uuid,
    actor_id: Uuid,
    data: TimeEntryInvoiceData,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let entries = self
      .time_entry_repo
      .find_billable(company_id, data.project_id, data.from, data.to)
      .await?;

    let line_items = time_entries::aggregate_billable(&entries, self.settings.default_hourly_rate)?;
    if line_items.is_empty() {
      return Err(InvoiceError::NoBillableTimeEntries {
        from: data.from,
        to: data.to,
      });
    }

    debug!(
      entries = entries.len(),
      performers = line_items.len(),
      "Aggregated billable time entries"
    );

    self
      .create_invoice(
        company_id,
        actor_id,
        InvoiceData {
          customer_id: data.customer_id,
          issue_date: data.issue_date,
          due_date: data.due_date,
          payment_terms: data.payment_terms,
          status: Some(InvoiceStatus::Draft),
          notes: data.notes,
          line_items,
        },
      )
      .await
  }

  pub async fn update_invoice(
    &self,
    company_id: Uuid,
    invoice_id: Uuid,
    data: InvoiceUpdateData,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let mut invoice = self.load_invoice(company_id, invoice_id).await?;
    lifecycle::ensure_editable(invoice.status)?;
    let expected = ExpectedState::of(&invoice);

    if data.line_items.is_empty() {
      return Err(InvoiceError::NoLineItems);
    }
    self.verify_customer(company_id, data.customer_id).await?;

    let calculation = calculator::calculate(data.line_items, self.settings.vat_rate)?;
    let due_date = self.resolve_due_date(data.issue_date, data.due_date, data.payment_terms)?;

    invoice.update(
      data.customer_id,
      data.issue_date,
      due_date,
      data.notes,
      calculation.totals,
    )?;

    let line_items = calculation
      .lines
      .into_iter()
      .map(|line| InvoiceLineItem::from_calculated(invoice.id, line))
      .collect();

    let (invoice, line_items) = self
      .invoice_repo
      .update_with_line_items(invoice, expected, line_items)
      .await?;

    info!(invoice_id = %invoice.id, total = %invoice.total_amount.amount(), "Invoice updated");

    Ok((invoice, line_items))
  }

  pub async fn send_invoice(
    &self,
    company_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<Invoice, InvoiceError> {
    let mut invoice = self.load_invoice(company_id, invoice_id).await?;
    let expected = ExpectedState::of(&invoice);
    invoice.send()?;
    let invoice = self.invoice_repo.update(invoice, expected).await?;

    info!(invoice_id = %invoice.id, from = %expected.status, to = %invoice.status, "Invoice sent");

    let title = if expected.status == InvoiceStatus::Draft {
      "Invoice sent"
    } else {
      "Invoice reminder sent"
    };
    let message = format!(
      "Invoice {} over {} was sent to the customer",
      invoice.invoice_number, invoice.total_amount
    );
    self.notify(&invoice, title, message, Severity::Info);

    Ok(invoice)
  }

  pub async fn cancel_invoice(
    &self,
    company_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<Invoice, InvoiceError> {
    let mut invoice = self.load_invoice(company_id, invoice_id).await?;
    let expected = ExpectedState::of(&invoice);
    invoice.cancel()?;
    let invoice = self.invoice_repo.update(invoice, expected).await?;

    info!(invoice_id = %invoice.id, "Invoice cancelled");

    let message = format!("Invoice {} was cancelled", invoice.invoice_number);
    self.notify(&invoice, "Invoice cancelled", message, Severity::Warning);

    Ok(invoice)
  }

  pub async fn delete_invoice(&self, company_id: Uuid, invoice_id: Uuid) -> Result<(), InvoiceError> {
    let invoice = self.load_invoice(company_id, invoice_id).await?;
    invoice.ensure_deletable()?;
    // The store checks again against the locked row
    self.invoice_repo.delete(invoice.id).await?;

    info!(invoice_id = %invoice.id, invoice_number = %invoice.invoice_number, "Invoice deleted");
    Ok(())
  }

  pub async fn apply_payment(
    &self,
    company_id: Uuid,
    invoice_id: Uuid,
    actor_id: Option<Uuid>,
    data: PaymentData,
  ) -> Result<(Invoice, Payment), InvoiceError> {
    if data.amount <= Decimal::ZERO {
      return Err(InvoiceError::InvalidAmount(
        "Payment amount must be greater than zero".to_string(),
      ));
    }
    let amount = Money::new(data.amount)?;

    let mut invoice = self.load_invoice(company_id, invoice_id).await?;
    let expected = ExpectedState::of(&invoice);
    invoice.apply_payment(amount)?;

    let draft = PaymentDraft {
      amount,
      payment_date: data
        .payment_date
        .unwrap_or_else(|| Utc::now().date_naive()),
      reference: data.reference,
      notes: data.notes,
      created_by: actor_id,
    };
    let (invoice, payment) = self
      .invoice_repo
      .record_payment(invoice, expected, draft)
      .await?;

    info!(
      invoice_id = %invoice.id,
      payment_number = %payment.payment_number,
      amount = %payment.amount.amount(),
      paid = %invoice.paid_amount.amount(),
      status = %invoice.status,
      "Payment recorded"
    );

    if invoice.status == InvoiceStatus::Paid {
      let message = format!("Invoice {} has been paid in full", invoice.invoice_number);
      self.notify(&invoice, "Invoice paid", message, Severity::Success);
    } else {
      let message = format!(
        "Received {} for invoice {}, {} outstanding",
        payment.amount,
        invoice.invoice_number,
        invoice.outstanding()
      );
      self.notify(&invoice, "Payment received", message, Severity::Info);
    }

    Ok((invoice, payment))
  }

  /// Marks every sent or partially paid invoice due before `today` as
  /// overdue. Running it again without new candidates changes nothing. With
  /// an actor, the sweep and its audit record commit together or not at all.
  pub async fn sweep_overdue(
    &self,
    company_id: Uuid,
    actor_id: Option<Uuid>,
    today: NaiveDate,
  ) -> Result<SweepOutcome, InvoiceError> {
    let audit = actor_id.map(|actor_id| SweepAudit {
      actor_id,
      retention_until: self.retention_until(),
    });
    let invoice_ids = self
      .invoice_repo
      .mark_overdue(company_id, today, audit)
      .await?;

    if invoice_ids.is_empty() {
      debug!(%company_id, %today, "No invoices became overdue");
    } else {
      info!(%company_id, count = invoice_ids.len(), "Invoices marked overdue");
    }

    Ok(SweepOutcome {
      updated_count: invoice_ids.len(),
      invoice_ids,
    })
  }

  /// Assigns references to invoices created before references existed,
  /// oldest first. Returns the number of invoices changed.
  pub async fn backfill_reference_codes(&self, company_id: Uuid) -> Result<usize, InvoiceError> {
    let invoices = self.invoice_repo.find_missing_reference(company_id).await?;

    let mut updated = 0;
    for invoice in invoices {
      let assigned = self
        .invoice_repo
        .assign_reference(invoice.id, self.settings.reference_prefix.as_deref())
        .await?;
      if assigned.is_some() {
        updated += 1;
      }
    }

    info!(%company_id, updated, "Reference codes backfilled");
    Ok(updated)
  }

  pub async fn get_invoice(
    &self,
    company_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<InvoiceDetails, InvoiceError> {
    let invoice = self.load_invoice(company_id, invoice_id).await?;
    let line_items = self.line_item_repo.find_by_invoice_id(invoice.id).await?;
    let payments = self.payment_repo.find_by_invoice_id(invoice.id).await?;

    Ok(InvoiceDetails {
      invoice,
      line_items,
      payments,
    })
  }

  pub async fn list_invoices(
    &self,
    company_id: Uuid,
    filter: InvoiceFilter,
    today: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    self.invoice_repo.search(company_id, &filter, today).await
  }

  // Helper methods
  async fn load_invoice(&self, company_id: Uuid, invoice_id: Uuid) -> Result<Invoice, InvoiceError> {
    self
      .invoice_repo
      .find_by_id(invoice_id)
      .await?
      .filter(|invoice| invoice.company_id == company_id)
      .ok_or(InvoiceError::InvoiceNotFound(invoice_id))
  }

  async fn verify_customer(&self, company_id: Uuid, customer_id: Uuid) -> Result<(), InvoiceError> {
    self
      .customer_repo
      .find_by_id(customer_id)
      .await?
      .filter(|customer| customer.company_id == company_id)
      .map(|_| ())
      .ok_or(InvoiceError::CustomerNotFound(customer_id))
  }

  fn resolve_due_date(
    &self,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    payment_terms: Option<PaymentTerms>,
  ) -> Result<NaiveDate, InvoiceError> {
    if let Some(due_date) = due_date {
      return Ok(due_date);
    }
    let terms = payment_terms.unwrap_or(self.settings.default_payment_terms);
    issue_date
      .checked_add_signed(Duration::days(i64::from(terms.days())))
      .ok_or_else(|| {
        InvoiceError::Validation(ValueObjectError::InvalidPaymentTerms(format!(
          "Payment terms '{}' overflow the calendar",
          terms
        )))
      })
  }

  fn retention_until(&self) -> DateTime<Utc> {
    Utc::now()
      .checked_add_months(Months::new(self.settings.audit_retention_years * 12))
      .unwrap_or(DateTime::<Utc>::MAX_UTC)
  }

  /// Delivery runs in the background. Failures are logged and never undo
  /// the state change or delay the caller.
  fn notify(&self, invoice: &Invoice, title: &str, message: String, severity: Severity) {
    let notification = Notification {
      title: title.to_string(),
      message,
      severity,
      category: NOTIFICATION_CATEGORY.to_string(),
      action_url: Some(format!("/invoices/{}", invoice.id)),
      target_user_id: Some(invoice.created_by),
      source_type: INVOICE_ENTITY.to_string(),
      source_id: invoice.id,
    };

    let notifier = Arc::clone(&self.notifier);
    let company_id = invoice.company_id;
    let invoice_id = invoice.id;
    tokio::spawn(async move {
      if let Err(e) = notifier.notify(company_id, notification).await {
        warn!(%invoice_id, error = %e, "Failed to deliver invoice notification");
      }
    });
  }
}
