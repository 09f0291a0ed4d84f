use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct SweepOverdueCommand {
  pub company_id: Uuid,
  pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SweepOverdueResponse {
  pub updated_count: usize,
  pub invoice_ids: Vec<Uuid>,
}

pub struct SweepOverdueUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl SweepOverdueUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: SweepOverdueCommand,
  ) -> Result<SweepOverdueResponse, InvoiceError> {
    let outcome = self
      .invoice_service
      .sweep_overdue(command.company_id, command.user_id, Utc::now().date_naive())
      .await?;

    Ok(SweepOverdueResponse {
      updated_count: outcome.updated_count,
      invoice_ids: outcome.invoice_ids,
    })
  }
}
