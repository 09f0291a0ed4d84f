use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::invoice::{Customer, errors::InvoiceError, ports::CustomerRepository};

#[derive(Debug, FromRow)]
struct CustomerRow {
  id: Uuid,
  company_id: Uuid,
  name: String,
  archived_at: Option<DateTime<Utc>>,
}

impl From<CustomerRow> for Customer {
  fn from(row: CustomerRow) -> Self {
    Customer {
      id: row.id,
      company_id: row.company_id,
      name: row.name,
      archived_at: row.archived_at,
    }
  }
}

/// Read-only view of the customers table.
pub struct PostgresCustomerRepository {
  pool: PgPool,
}

impl PostgresCustomerRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, InvoiceError> {
    let row = sqlx::query_as::<_, CustomerRow>(
      r#"
            SELECT id, company_id, name, archived_at
            FROM customers
            WHERE id = $1
            "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Customer::from))
  }
}
