use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct BackfillReferenceCodesCommand {
  pub company_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BackfillReferenceCodesResponse {
  pub updated_count: usize,
}

pub struct BackfillReferenceCodesUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl BackfillReferenceCodesUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: BackfillReferenceCodesCommand,
  ) -> Result<BackfillReferenceCodesResponse, InvoiceError> {
    let updated_count = self
      .invoice_service
      .backfill_reference_codes(command.company_id)
      .await?;

    Ok(BackfillReferenceCodesResponse { updated_count })
  }
}
