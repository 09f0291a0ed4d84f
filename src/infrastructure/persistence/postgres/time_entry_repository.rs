use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::invoice::{
  Money, TimeEntry, errors::InvoiceError, ports::TimeEntryRepository,
};

#[derive(Debug, FromRow)]
struct TimeEntryRow {
  id: Uuid,
  company_id: Uuid,
  project_id: Option<Uuid>,
  user_id: Uuid,
  performer_name: String,
  work_date: NaiveDate,
  minutes: i32,
  hourly_rate: Option<Decimal>,
  billable: bool,
}

impl TryFrom<TimeEntryRow> for TimeEntry {
  type Error = InvoiceError;

  fn try_from(row: TimeEntryRow) -> Result<Self, Self::Error> {
    Ok(TimeEntry {
      id: row.id,
      company_id: row.company_id,
      project_id: row.project_id,
      user_id: row.user_id,
      performer_name: row.performer_name,
      work_date: row.work_date,
      minutes: row.minutes,
      hourly_rate: row.hourly_rate.map(Money::new).transpose()?,
      billable: row.billable,
    })
  }
}

pub struct PostgresTimeEntryRepository {
  pool: PgPool,
}

impl PostgresTimeEntryRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl TimeEntryRepository for PostgresTimeEntryRepository {
  async fn find_billable(
    &self,
    company_id: Uuid,
    project_id: Option<Uuid>,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TimeEntry>, InvoiceError> {
    let rows = sqlx::query_as::<_, TimeEntryRow>(
      r#"
            SELECT id, company_id, project_id, user_id, performer_name,
                   work_date, minutes, hourly_rate, billable
            FROM time_entries
            WHERE company_id = $1
              AND billable
              AND ($2::uuid IS NULL OR project_id = $2)
              AND work_date BETWEEN $3 AND $4
            ORDER BY work_date ASC, id ASC
            "#,
    )
    .bind(company_id)
    .bind(project_id)
    .bind(from)
    .bind(to)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::infrastructure::persistence::postgres::test_support::{date, setup_test_db};

  async fn insert_entry(
    pool: &PgPool,
    company_id: Uuid,
    project_id: Option<Uuid>,
    work_date: NaiveDate,
    billable: bool,
  ) {
    sqlx::query(
      r#"
            INSERT INTO time_entries (id, company_id, project_id, user_id, performer_name,
                                      work_date, minutes, hourly_rate, billable)
            VALUES ($1, $2, $3, $4, 'Anna Muster', $5, 90, 120, $6)
            "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(project_id)
    .bind(Uuid::new_v4())
    .bind(work_date)
    .bind(billable)
    .execute(pool)
    .await
    .expect("Failed to insert time entry");
  }

  #[tokio::test]
  async fn test_find_billable_filters_range_and_project() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresTimeEntryRepository::new(pool.clone());

    let company_id = Uuid::new_v4();
    let project_id = Uuid::new_v4();
    insert_entry(&pool, company_id, Some(project_id), date(2026, 5, 1), true).await;
    insert_entry(&pool, company_id, Some(project_id), date(2026, 5, 31), true).await;
    insert_entry(&pool, company_id, Some(project_id), date(2026, 6, 1), true).await;
    insert_entry(&pool, company_id, Some(project_id), date(2026, 5, 10), false).await;
    insert_entry(&pool, company_id, None, date(2026, 5, 10), true).await;
    insert_entry(&pool, Uuid::new_v4(), None, date(2026, 5, 10), true).await;

    let from = date(2026, 5, 1);
    let to = date(2026, 5, 31);

    let all = repo.find_billable(company_id, None, from, to).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|e| e.billable));

    let project = repo
      .find_billable(company_id, Some(project_id), from, to)
      .await
      .unwrap();
    assert_eq!(project.len(), 2);
    assert_eq!(project[0].hourly_rate.unwrap().amount(), Decimal::from(120));
  }
}
