use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use std::fmt;

use crate::domain::invoice::{ErrorKind, InvoiceError};

use super::dtos::ErrorResponse;

/// API error type that maps domain errors to HTTP responses
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
  /// Malformed or invalid input (400 Bad Request)
  Validation(String),

  /// Missing or malformed actor header (401 Unauthorized)
  Unauthorized(String),

  /// Unknown invoice or customer (404 Not Found)
  NotFound(String),

  /// Operation not allowed in the current status (409 Conflict)
  InvalidState(String),

  /// Duplicate number or lost update (409 Conflict)
  Conflict(String),

  /// Payment larger than the outstanding balance (422 Unprocessable Entity)
  OverPayment(String),

  /// Internal server error (500 Internal Server Error)
  Internal(String),
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
      ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
      ApiError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
      ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
      ApiError::OverPayment(msg) => write!(f, "Over payment: {}", msg),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::InvalidState(_) => StatusCode::CONFLICT,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::OverPayment(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (error_type, message) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone()),
      ApiError::Unauthorized(msg) => ("unauthorized", msg.clone()),
      ApiError::NotFound(msg) => ("not_found", msg.clone()),
      ApiError::InvalidState(msg) => ("invalid_state_transition", msg.clone()),
      ApiError::Conflict(msg) => ("conflict", msg.clone()),
      ApiError::OverPayment(msg) => ("over_payment", msg.clone()),
      ApiError::Internal(msg) => {
        // Don't expose internal error details
        tracing::error!("Internal error: {}", msg);
        (
          "internal_error",
          "An internal server error occurred".to_string(),
        )
      }
    };

    let error_response = ErrorResponse {
      error: error_type.to_string(),
      message,
      details: None,
    };

    HttpResponse::build(status)
      .content_type(ContentType::json())
      .json(error_response)
  }
}

impl From<InvoiceError> for ApiError {
  fn from(error: InvoiceError) -> Self {
    let message = error.to_string();
    match error.kind() {
      ErrorKind::NotFound => ApiError::NotFound(message),
      ErrorKind::Validation => ApiError::Validation(message),
      ErrorKind::InvalidStateTransition => ApiError::InvalidState(message),
      ErrorKind::OverPayment => ApiError::OverPayment(message),
      ErrorKind::Conflict => ApiError::Conflict(message),
      ErrorKind::Internal => ApiError::Internal(message),
    }
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut messages: Vec<String> = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors
          .iter()
          .map(|error| {
            error
              .message
              .as_ref()
              .map(|m| m.to_string())
              .unwrap_or_else(|| format!("Invalid field: {}", field))
          })
          .collect::<Vec<_>>()
      })
      .collect();

    if messages.is_empty() {
      // Errors nested in line items only show up in the display form
      messages.push(errors.to_string());
    }

    ApiError::Validation(messages.join(", "))
  }
}
