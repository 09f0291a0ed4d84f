//! Per-company counters in `document_sequences`, one row per company, kind
//! and year.
//!
//! Values are drawn on the caller's connection. Inside the transaction that
//! inserts the document the counter row stays locked until commit, and a
//! rollback hands the value back.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::invoice::numbering::REFERENCE_SEQUENCE_YEAR;
use crate::domain::invoice::{
  InvoiceNumber, PaymentNumber, ReferenceCode, SequenceKind, errors::InvoiceError,
};

/// Highest number already issued before the counter row existed.
async fn legacy_seed(
  conn: &mut PgConnection,
  company_id: Uuid,
  kind: SequenceKind,
  year: i32,
) -> Result<i64, InvoiceError> {
  let seed = match kind {
    SequenceKind::Invoice => {
      sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COALESCE(MAX(CAST(substring(invoice_number FROM '(\d+)$') AS BIGINT)), 0)
            FROM invoices
            WHERE company_id = $1 AND starts_with(invoice_number, $2)
            "#,
      )
      .bind(company_id)
      .bind(InvoiceNumber::year_prefix(year))
      .fetch_one(&mut *conn)
      .await?
    }
    SequenceKind::Payment => {
      sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COALESCE(MAX(CAST(substring(payment_number FROM '(\d+)$') AS BIGINT)), 0)
            FROM payments
            WHERE company_id = $1 AND starts_with(payment_number, $2)
            "#,
      )
      .bind(company_id)
      .bind(PaymentNumber::year_prefix(year))
      .fetch_one(&mut *conn)
      .await?
    }
    // References carry no readable counter; collisions are skipped on draw
    SequenceKind::Reference => {
      sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COUNT(*)
            FROM invoices
            WHERE company_id = $1 AND reference_code IS NOT NULL
            "#,
      )
      .bind(company_id)
      .fetch_one(&mut *conn)
      .await?
    }
  };
  Ok(seed)
}

pub(super) async fn next_value(
  conn: &mut PgConnection,
  company_id: Uuid,
  kind: SequenceKind,
  year: i32,
) -> Result<u64, InvoiceError> {
  let bumped = sqlx::query_scalar::<_, i64>(
    r#"
            UPDATE document_sequences
            SET last_value = last_value + 1
            WHERE company_id = $1 AND kind = $2 AND year = $3
            RETURNING last_value
            "#,
  )
  .bind(company_id)
  .bind(kind.as_str())
  .bind(year)
  .fetch_optional(&mut *conn)
  .await?;

  let value = match bumped {
    Some(value) => value,
    None => {
      let seed = legacy_seed(conn, company_id, kind, year).await?;
      // Concurrent first callers collide on the primary key and the loser
      // increments the row the winner created.
      sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO document_sequences (company_id, kind, year, last_value)
            VALUES ($1, $2, $3, $4 + 1)
            ON CONFLICT (company_id, kind, year)
            DO UPDATE SET last_value = document_sequences.last_value + 1
            RETURNING last_value
            "#,
      )
      .bind(company_id)
      .bind(kind.as_str())
      .bind(year)
      .bind(seed)
      .fetch_one(&mut *conn)
      .await?
    }
  };

  u64::try_from(value)
    .map_err(|_| InvoiceError::Repository(format!("Negative {} counter", kind.as_str())))
}

/// Draws reference counters until one yields a reference the company does
/// not use yet.
pub(super) async fn next_free_reference(
  conn: &mut PgConnection,
  company_id: Uuid,
  prefix: Option<&str>,
) -> Result<ReferenceCode, InvoiceError> {
  loop {
    let counter = next_value(
      conn,
      company_id,
      SequenceKind::Reference,
      REFERENCE_SEQUENCE_YEAR,
    )
    .await?;
    let reference = ReferenceCode::generate(counter, prefix);

    let taken = sqlx::query_scalar::<_, bool>(
      r#"
            SELECT EXISTS (
                SELECT 1 FROM invoices WHERE company_id = $1 AND reference_code = $2
            )
            "#,
    )
    .bind(company_id)
    .bind(reference.value())
    .fetch_one(&mut *conn)
    .await?;

    if !taken {
      return Ok(reference);
    }
  }
}
