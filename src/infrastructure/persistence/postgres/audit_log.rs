use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::invoice::{AuditRecord, errors::InvoiceError};

/// Appends to `audit_log` on the caller's connection so the record commits
/// with the change it describes.
pub(super) async fn insert_audit_record(
  conn: &mut PgConnection,
  record: &AuditRecord,
) -> Result<(), InvoiceError> {
  sqlx::query(
    r#"
            INSERT INTO audit_log (
                id, company_id, actor_id, module, entity_type, action,
                description, metadata, retention_until
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
  )
  .bind(Uuid::new_v4())
  .bind(record.company_id)
  .bind(record.actor_id)
  .bind(&record.module)
  .bind(&record.entity_type)
  .bind(&record.action)
  .bind(&record.description)
  .bind(&record.metadata)
  .bind(record.retention_until)
  .execute(&mut *conn)
  .await
  .map_err(|e| InvoiceError::Audit(e.to_string()))?;

  Ok(())
}
