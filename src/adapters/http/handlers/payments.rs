use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::optional_actor_id;
use crate::{
  adapters::http::{dtos::RecordPaymentRequest, errors::ApiError},
  application::invoice::{RecordPaymentCommand, RecordPaymentUseCase},
};

/// Record a payment against an invoice
/// POST /api/v1/companies/{company_id}/invoices/{invoice_id}/payments
pub async fn record_payment_handler(
  path: web::Path<(Uuid, Uuid)>,
  request: web::Json<RecordPaymentRequest>,
  use_case: web::Data<Arc<RecordPaymentUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;
  let (company_id, invoice_id) = path.into_inner();
  let request = request.into_inner();

  let command = RecordPaymentCommand {
    company_id,
    invoice_id,
    user_id: optional_actor_id(&http_req)?,
    amount: request.amount,
    payment_date: request.payment_date,
    reference: request.reference,
    notes: request.notes,
  };

  let response = use_case.execute(command).await?;
  Ok(HttpResponse::Created().json(response))
}
