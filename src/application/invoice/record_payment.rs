use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::dto::PaymentDto;
use crate::domain::invoice::{InvoiceError, InvoiceService, PaymentData, PaymentProgress};

#[derive(Debug, Deserialize)]
pub struct RecordPaymentCommand {
  pub company_id: Uuid,
  pub invoice_id: Uuid,
  pub user_id: Option<Uuid>,
  pub amount: Decimal,
  pub payment_date: Option<NaiveDate>,
  pub reference: Option<String>,
  pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
  pub payment: PaymentDto,
  pub invoice_status: String,
  pub paid_amount: Decimal,
  pub outstanding_amount: Decimal,
  pub payment_progress: PaymentProgress,
}

pub struct RecordPaymentUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl RecordPaymentUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: RecordPaymentCommand,
  ) -> Result<RecordPaymentResponse, InvoiceError> {
    let data = PaymentData {
      amount: command.amount,
      payment_date: command.payment_date,
      reference: command.reference,
      notes: command.notes,
    };

    let (invoice, payment) = self
      .invoice_service
      .apply_payment(command.company_id, command.invoice_id, command.user_id, data)
      .await?;

    Ok(RecordPaymentResponse {
      payment: PaymentDto::from(&payment),
      invoice_status: invoice.status.as_str().to_string(),
      paid_amount: invoice.paid_amount.amount(),
      outstanding_amount: invoice.outstanding().amount(),
      payment_progress: invoice.payment_progress(),
    })
  }
}
