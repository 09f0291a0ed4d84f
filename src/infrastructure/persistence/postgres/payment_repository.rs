use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::invoice::{
  Money, Payment, PaymentNumber, errors::InvoiceError, ports::PaymentRepository,
};

#[derive(Debug, FromRow)]
struct PaymentRow {
  id: Uuid,
  payment_number: String,
  company_id: Uuid,
  invoice_id: Uuid,
  customer_id: Uuid,
  amount: Decimal,
  payment_date: NaiveDate,
  reference: Option<String>,
  notes: Option<String>,
  created_by: Option<Uuid>,
  created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
  type Error = InvoiceError;

  fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
    Ok(Payment {
      id: row.id,
      payment_number: PaymentNumber::new(row.payment_number)?,
      company_id: row.company_id,
      invoice_id: row.invoice_id,
      customer_id: row.customer_id,
      amount: Money::new(row.amount)?,
      payment_date: row.payment_date,
      reference: row.reference,
      notes: row.notes,
      created_by: row.created_by,
      created_at: row.created_at,
    })
  }
}

pub(super) async fn insert_payment(
  conn: &mut PgConnection,
  payment: &Payment,
) -> Result<Payment, InvoiceError> {
  let row = sqlx::query_as::<_, PaymentRow>(
    r#"
            INSERT INTO payments (
                id, payment_number, company_id, invoice_id, customer_id, amount,
                payment_date, reference, notes, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, payment_number, company_id, invoice_id, customer_id, amount,
                      payment_date, reference, notes, created_by, created_at
            "#,
  )
  .bind(payment.id)
  .bind(payment.payment_number.value())
  .bind(payment.company_id)
  .bind(payment.invoice_id)
  .bind(payment.customer_id)
  .bind(payment.amount.amount())
  .bind(payment.payment_date)
  .bind(&payment.reference)
  .bind(&payment.notes)
  .bind(payment.created_by)
  .bind(payment.created_at)
  .fetch_one(&mut *conn)
  .await?;

  row.try_into()
}

pub struct PostgresPaymentRepository {
  pool: PgPool,
}

impl PostgresPaymentRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
  async fn find_by_invoice_id(&self, invoice_id: Uuid) -> Result<Vec<Payment>, InvoiceError> {
    let rows = sqlx::query_as::<_, PaymentRow>(
      r#"
            SELECT id, payment_number, company_id, invoice_id, customer_id, amount,
                   payment_date, reference, notes, created_by, created_at
            FROM payments
            WHERE invoice_id = $1
            ORDER BY payment_date ASC, payment_number ASC
            "#,
    )
    .bind(invoice_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }
}
