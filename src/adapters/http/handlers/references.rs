use actix_web::{HttpResponse, web};
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::{
      QrIbanCheckRequest, QrIbanCheckResponse, ValidateReferenceRequest,
      ValidateReferenceResponse,
    },
    errors::ApiError,
  },
  domain::invoice::{
    ReferenceCode,
    reference::{is_qr_iban, validate_reference},
  },
};

/// Check a structured reference, spaces allowed
/// POST /api/v1/references/validate
pub async fn validate_reference_handler(
  request: web::Json<ValidateReferenceRequest>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let valid = validate_reference(&request.reference);
  let formatted = if valid {
    ReferenceCode::new(request.reference.as_str())
      .ok()
      .map(|r| r.formatted())
  } else {
    None
  };

  Ok(HttpResponse::Ok().json(ValidateReferenceResponse { valid, formatted }))
}

/// Whether an IBAN is a QR-IBAN (institution id 30000..=31999)
/// POST /api/v1/iban/qr-check
pub async fn qr_iban_check_handler(
  request: web::Json<QrIbanCheckRequest>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  Ok(HttpResponse::Ok().json(QrIbanCheckResponse {
    qr_iban: is_qr_iban(&request.iban),
  }))
}
