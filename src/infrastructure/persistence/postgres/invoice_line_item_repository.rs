use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::invoice::{
  DiscountPercent, InvoiceLineItem, LineItemDescription, Money, Quantity, VatRate,
  errors::InvoiceError, ports::InvoiceLineItemRepository,
};

#[derive(Debug, FromRow)]
struct LineItemRow {
  id: Uuid,
  invoice_id: Uuid,
  position: i32,
  description: String,
  quantity: Decimal,
  unit: String,
  unit_price: Decimal,
  discount_percent: Option<Decimal>,
  line_total: Decimal,
  tax_rate: Decimal,
  tax_amount: Decimal,
}

impl TryFrom<LineItemRow> for InvoiceLineItem {
  type Error = InvoiceError;

  fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
    Ok(InvoiceLineItem {
      id: row.id,
      invoice_id: row.invoice_id,
      position: row.position,
      description: LineItemDescription::new(row.description)?,
      quantity: Quantity::new(row.quantity)?,
      unit: row.unit,
      unit_price: Money::new(row.unit_price)?,
      discount: row.discount_percent.map(DiscountPercent::new).transpose()?,
      line_total: Money::new(row.line_total)?,
      tax_rate: VatRate::new(row.tax_rate)?,
      tax_amount: Money::new(row.tax_amount)?,
    })
  }
}

/// Inserts the items on an open connection so callers can wrap them in the
/// invoice's transaction.
pub(super) async fn insert_line_items(
  conn: &mut PgConnection,
  line_items: &[InvoiceLineItem],
) -> Result<Vec<InvoiceLineItem>, InvoiceError> {
  let mut stored = Vec::with_capacity(line_items.len());
  for item in line_items {
    let row = sqlx::query_as::<_, LineItemRow>(
      r#"
            INSERT INTO invoice_line_items (
                id, invoice_id, position, description, quantity, unit,
                unit_price, discount_percent, line_total, tax_rate, tax_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, invoice_id, position, description, quantity, unit,
                      unit_price, discount_percent, line_total, tax_rate, tax_amount
            "#,
    )
    .bind(item.id)
    .bind(item.invoice_id)
    .bind(item.position)
    .bind(item.description.value())
    .bind(item.quantity.value())
    .bind(&item.unit)
    .bind(item.unit_price.amount())
    .bind(item.discount.map(|d| d.value()))
    .bind(item.line_total.amount())
    .bind(item.tax_rate.value())
    .bind(item.tax_amount.amount())
    .fetch_one(&mut *conn)
    .await?;

    stored.push(row.try_into()?);
  }
  Ok(stored)
}

pub(super) async fn delete_line_items(
  conn: &mut PgConnection,
  invoice_id: Uuid,
) -> Result<(), InvoiceError> {
  sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = $1")
    .bind(invoice_id)
    .execute(&mut *conn)
    .await?;
  Ok(())
}

pub struct PostgresInvoiceLineItemRepository {
  pool: PgPool,
}

impl PostgresInvoiceLineItemRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl InvoiceLineItemRepository for PostgresInvoiceLineItemRepository {
  async fn find_by_invoice_id(
    &self,
    invoice_id: Uuid,
  ) -> Result<Vec<InvoiceLineItem>, InvoiceError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
      r#"
            SELECT id, invoice_id, position, description, quantity, unit,
                   unit_price, discount_percent, line_total, tax_rate, tax_amount
            FROM invoice_line_items
            WHERE invoice_id = $1
            ORDER BY position ASC
            "#,
    )
    .bind(invoice_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }
}
