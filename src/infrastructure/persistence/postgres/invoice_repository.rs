use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use super::audit_log::insert_audit_record;
use super::invoice_line_item_repository::{delete_line_items, insert_line_items};
use super::payment_repository::insert_payment;
use super::sequences::{next_free_reference, next_value};
use crate::domain::invoice::ports::{ExpectedState, SweepAudit, without_whitespace};
use crate::domain::invoice::{
  Invoice, InvoiceDraft, InvoiceFilter, InvoiceLineItem, InvoiceNumber, InvoiceStatus, Money,
  Payment, PaymentDraft, ReferenceCode, SequenceKind, errors::InvoiceError, lifecycle,
  ports::InvoiceRepository,
};

#[derive(Debug, FromRow)]
struct InvoiceRow {
  id: Uuid,
  company_id: Uuid,
  customer_id: Uuid,
  invoice_number: String,
  status: String,
  issue_date: NaiveDate,
  due_date: NaiveDate,
  paid_at: Option<DateTime<Utc>>,
  subtotal: Decimal,
  tax_amount: Decimal,
  total_amount: Decimal,
  paid_amount: Decimal,
  reference_code: Option<String>,
  notes: Option<String>,
  created_by: Uuid,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
  type Error = InvoiceError;

  fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
    let invoice_number = InvoiceNumber::new(row.invoice_number)?;
    let status = InvoiceStatus::from_str(&row.status)?;
    let reference_code = row.reference_code.map(ReferenceCode::new).transpose()?;

    Ok(Invoice {
      id: row.id,
      company_id: row.company_id,
      customer_id: row.customer_id,
      invoice_number,
      status,
      issue_date: row.issue_date,
      due_date: row.due_date,
      paid_at: row.paid_at,
      subtotal: Money::new(row.subtotal)?,
      tax_amount: Money::new(row.tax_amount)?,
      total_amount: Money::new(row.total_amount)?,
      paid_amount: Money::new(row.paid_amount)?,
      reference_code,
      notes: row.notes,
      created_by: row.created_by,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

fn map_insert_error(e: sqlx::Error, invoice: &Invoice) -> InvoiceError {
  if let sqlx::Error::Database(db_err) = &e {
    // PostgreSQL unique violation code
    if db_err.code().as_deref() == Some("23505") {
      match db_err.constraint() {
        Some("invoices_company_number_unique") => {
          return InvoiceError::InvoiceNumberAlreadyExists(invoice.invoice_number.to_string());
        }
        Some("invoices_company_reference_unique") => {
          let reference = invoice
            .reference_code
            .as_ref()
            .map(|r| r.value().to_string())
            .unwrap_or_default();
          return InvoiceError::ReferenceAlreadyExists(reference);
        }
        _ => {}
      }
    }
  }
  InvoiceError::Database(e)
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
  let escaped = term
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{}%", escaped)
}

/// Inserts the invoice row on an open connection.
pub(super) async fn insert_invoice(
  conn: &mut PgConnection,
  invoice: &Invoice,
) -> Result<Invoice, InvoiceError> {
  let row = sqlx::query_as::<_, InvoiceRow>(
    r#"
            INSERT INTO invoices (
                id, company_id, customer_id, invoice_number, status,
                issue_date, due_date, paid_at, subtotal, tax_amount,
                total_amount, paid_amount, reference_code, notes,
                created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id, company_id, customer_id, invoice_number, status,
                      issue_date, due_date, paid_at, subtotal, tax_amount,
                      total_amount, paid_amount, reference_code, notes,
                      created_by, created_at, updated_at
            "#,
  )
  .bind(invoice.id)
  .bind(invoice.company_id)
  .bind(invoice.customer_id)
  .bind(invoice.invoice_number.value())
  .bind(invoice.status.as_str())
  .bind(invoice.issue_date)
  .bind(invoice.due_date)
  .bind(invoice.paid_at)
  .bind(invoice.subtotal.amount())
  .bind(invoice.tax_amount.amount())
  .bind(invoice.total_amount.amount())
  .bind(invoice.paid_amount.amount())
  .bind(invoice.reference_code.as_ref().map(|r| r.value()))
  .bind(&invoice.notes)
  .bind(invoice.created_by)
  .bind(invoice.created_at)
  .bind(invoice.updated_at)
  .fetch_one(&mut *conn)
  .await
  .map_err(|e| map_insert_error(e, invoice))?;

  row.try_into()
}

pub struct PostgresInvoiceRepository {
  pool: PgPool,
}

impl PostgresInvoiceRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn store(
    conn: &mut PgConnection,
    invoice: &Invoice,
    expected: &ExpectedState,
  ) -> Result<Invoice, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            UPDATE invoices
            SET customer_id = $2, status = $3, issue_date = $4, due_date = $5,
                subtotal = $6, tax_amount = $7, total_amount = $8,
                reference_code = $9, notes = $10, updated_at = $11
            WHERE id = $1 AND paid_amount = $12 AND status = $13
            RETURNING id, company_id, customer_id, invoice_number, status,
                      issue_date, due_date, paid_at, subtotal, tax_amount,
                      total_amount, paid_amount, reference_code, notes,
                      created_by, created_at, updated_at
            "#,
    )
    .bind(invoice.id)
    .bind(invoice.customer_id)
    .bind(invoice.status.as_str())
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.subtotal.amount())
    .bind(invoice.tax_amount.amount())
    .bind(invoice.total_amount.amount())
    .bind(invoice.reference_code.as_ref().map(|r| r.value()))
    .bind(&invoice.notes)
    .bind(invoice.updated_at)
    .bind(expected.paid_amount.amount())
    .bind(expected.status.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    row
      .ok_or(InvoiceError::ConcurrentModification(invoice.id))?
      .try_into()
  }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
  async fn create(
    &self,
    draft: InvoiceDraft,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let mut tx = self.pool.begin().await?;

    let sequence = next_value(
      &mut tx,
      draft.company_id,
      SequenceKind::Invoice,
      draft.numbering_year(),
    )
    .await?;
    let reference =
      next_free_reference(&mut tx, draft.company_id, draft.reference_prefix.as_deref()).await?;
    let (invoice, line_items) = draft.into_invoice(sequence, Some(reference))?;

    let stored = insert_invoice(&mut tx, &invoice).await?;
    let items = insert_line_items(&mut tx, &line_items).await?;
    tx.commit().await?;

    Ok((stored, items))
  }

  async fn update(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
  ) -> Result<Invoice, InvoiceError> {
    let mut conn = self.pool.acquire().await?;
    Self::store(&mut conn, &invoice, &expected).await
  }

  async fn update_with_line_items(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
    line_items: Vec<InvoiceLineItem>,
  ) -> Result<(Invoice, Vec<InvoiceLineItem>), InvoiceError> {
    let mut tx = self.pool.begin().await?;

    let stored = Self::store(&mut tx, &invoice, &expected).await?;
    delete_line_items(&mut tx, invoice.id).await?;
    let items = insert_line_items(&mut tx, &line_items).await?;

    tx.commit().await?;
    Ok((stored, items))
  }

  async fn record_payment(
    &self,
    invoice: Invoice,
    expected: ExpectedState,
    payment: PaymentDraft,
  ) -> Result<(Invoice, Payment), InvoiceError> {
    let mut tx = self.pool.begin().await?;

    // Compare-and-set on balance and status serializes writers.
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            UPDATE invoices
            SET paid_amount = $2, status = $3, paid_at = $4, updated_at = $5
            WHERE id = $1 AND paid_amount = $6 AND status = $7
            RETURNING id, company_id, customer_id, invoice_number, status,
                      issue_date, due_date, paid_at, subtotal, tax_amount,
                      total_amount, paid_amount, reference_code, notes,
                      created_by, created_at, updated_at
            "#,
    )
    .bind(invoice.id)
    .bind(invoice.paid_amount.amount())
    .bind(invoice.status.as_str())
    .bind(invoice.paid_at)
    .bind(invoice.updated_at)
    .bind(expected.paid_amount.amount())
    .bind(expected.status.as_str())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(InvoiceError::ConcurrentModification(invoice.id))?;
    let stored: Invoice = row.try_into()?;

    let sequence = next_value(
      &mut tx,
      stored.company_id,
      SequenceKind::Payment,
      payment.numbering_year(),
    )
    .await?;
    let payment = payment.into_payment(&stored, sequence);
    let payment = insert_payment(&mut tx, &payment).await?;
    tx.commit().await?;

    Ok((stored, payment))
  }

  async fn assign_reference(
    &self,
    invoice_id: Uuid,
    reference_prefix: Option<&str>,
  ) -> Result<Option<Invoice>, InvoiceError> {
    let mut tx = self.pool.begin().await?;

    let locked = sqlx::query_as::<_, (Uuid, bool)>(
      r#"
            SELECT company_id, reference_code IS NOT NULL
            FROM invoices
            WHERE id = $1
            FOR UPDATE
            "#,
    )
    .bind(invoice_id)
    .fetch_optional(&mut *tx)
    .await?;

    let company_id = match locked {
      None => return Err(InvoiceError::InvoiceNotFound(invoice_id)),
      Some((_, true)) => return Ok(None),
      Some((company_id, false)) => company_id,
    };

    let reference = next_free_reference(&mut tx, company_id, reference_prefix).await?;
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            UPDATE invoices
            SET reference_code = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_id, customer_id, invoice_number, status,
                      issue_date, due_date, paid_at, subtotal, tax_amount,
                      total_amount, paid_amount, reference_code, notes,
                      created_by, created_at, updated_at
            "#,
    )
    .bind(invoice_id)
    .bind(reference.value())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Some(row.try_into()?))
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, company_id, customer_id, invoice_number, status,
                   issue_date, due_date, paid_at, subtotal, tax_amount,
                   total_amount, paid_amount, reference_code, notes,
                   created_by, created_at, updated_at
            FROM invoices
            WHERE id = $1
            "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.map(|r| r.try_into()).transpose()
  }

  async fn search(
    &self,
    company_id: Uuid,
    filter: &InvoiceFilter,
    today: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let term = filter
      .search
      .as_deref()
      .map(str::trim)
      .filter(|term| !term.is_empty());
    let search = term.map(like_pattern);
    // References are stored without the spaces of their print form
    let reference_search = term
      .map(without_whitespace)
      .filter(|compact| !compact.is_empty())
      .map(|compact| like_pattern(&compact));

    let rows = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, company_id, customer_id, invoice_number, status,
                   issue_date, due_date, paid_at, subtotal, tax_amount,
                   total_amount, paid_amount, reference_code, notes,
                   created_by, created_at, updated_at
            FROM invoices
            WHERE company_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR customer_id = $3)
              AND ($4::text IS NULL
                   OR invoice_number ILIKE $4
                   OR notes ILIKE $4
                   OR reference_code LIKE $7)
              AND (NOT $5 OR (status IN ('sent', 'partial', 'overdue') AND due_date < $6))
            ORDER BY invoice_number DESC
            "#,
    )
    .bind(company_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.customer_id)
    .bind(search)
    .bind(filter.overdue)
    .bind(today)
    .bind(reference_search)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn find_missing_reference(&self, company_id: Uuid) -> Result<Vec<Invoice>, InvoiceError> {
    let rows = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, company_id, customer_id, invoice_number, status,
                   issue_date, due_date, paid_at, subtotal, tax_amount,
                   total_amount, paid_amount, reference_code, notes,
                   created_by, created_at, updated_at
            FROM invoices
            WHERE company_id = $1 AND reference_code IS NULL
            ORDER BY created_at ASC, invoice_number ASC
            "#,
    )
    .bind(company_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn mark_overdue(
    &self,
    company_id: Uuid,
    today: NaiveDate,
    audit: Option<SweepAudit>,
  ) -> Result<Vec<Uuid>, InvoiceError> {
    let mut tx = self.pool.begin().await?;

    let ids = sqlx::query_scalar::<_, Uuid>(
      r#"
            UPDATE invoices
            SET status = 'overdue', updated_at = NOW()
            WHERE company_id = $1
              AND status IN ('sent', 'partial')
              AND due_date < $2
            RETURNING id
            "#,
    )
    .bind(company_id)
    .bind(today)
    .fetch_all(&mut *tx)
    .await?;

    if let Some(audit) = audit.filter(|_| !ids.is_empty()) {
      insert_audit_record(&mut tx, &audit.record(company_id, today, &ids)).await?;
    }

    tx.commit().await?;
    Ok(ids)
  }

  async fn delete(&self, id: Uuid) -> Result<(), InvoiceError> {
    let mut tx = self.pool.begin().await?;

    let (status, paid_amount) = sqlx::query_as::<_, (String, Decimal)>(
      r#"
            SELECT status, paid_amount
            FROM invoices
            WHERE id = $1
            FOR UPDATE
            "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(InvoiceError::InvoiceNotFound(id))?;
    lifecycle::ensure_can_delete(InvoiceStatus::from_str(&status)?, Money::new(paid_amount)?)?;

    delete_line_items(&mut tx, id).await?;
    sqlx::query("DELETE FROM invoices WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(())
  }
}
