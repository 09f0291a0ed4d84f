use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{actor_id, optional_actor_id};
use crate::{
  adapters::http::{
    dtos::{
      CreateInvoiceFromTimeEntriesRequest, CreateInvoiceRequest, ListInvoicesQuery,
      SuccessResponse, UpdateInvoiceRequest,
    },
    errors::ApiError,
  },
  application::invoice::*,
};

/// Create invoice
/// POST /api/v1/companies/{company_id}/invoices
pub async fn create_invoice_handler(
  company_id: web::Path<Uuid>,
  request: web::Json<CreateInvoiceRequest>,
  use_case: web::Data<Arc<CreateInvoiceUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;
  let user_id = actor_id(&http_req)?;
  let request = request.into_inner();

  let command = CreateInvoiceCommand {
    user_id,
    company_id: company_id.into_inner(),
    customer_id: request.customer_id,
    issue_date: request.issue_date,
    due_date: request.due_date,
    payment_terms: request.payment_terms,
    status: request.status,
    notes: request.notes,
    line_items: request.line_items.into_iter().map(Into::into).collect(),
  };

  let response = use_case.execute(command).await?;
  Ok(HttpResponse::Created().json(response))
}

/// Create invoice from billable time entries
/// POST /api/v1/companies/{company_id}/invoices/from-time-entries
pub async fn create_invoice_from_time_entries_handler(
  company_id: web::Path<Uuid>,
  request: web::Json<CreateInvoiceFromTimeEntriesRequest>,
  use_case: web::Data<Arc<CreateInvoiceFromTimeEntriesUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;
  let user_id = actor_id(&http_req)?;
  let request = request.into_inner();

  let command = CreateInvoiceFromTimeEntriesCommand {
    user_id,
    company_id: company_id.into_inner(),
    customer_id: request.customer_id,
    project_id: request.project_id,
    from: request.from,
    to: request.to,
    issue_date: request.issue_date,
    due_date: request.due_date,
    payment_terms: request.payment_terms,
    notes: request.notes,
  };

  let response = use_case.execute(command).await?;
  Ok(HttpResponse::Created().json(response))
}

/// List invoices
/// GET /api/v1/companies/{company_id}/invoices?status=&customer_id=&search=&overdue=
pub async fn list_invoices_handler(
  company_id: web::Path<Uuid>,
  query: web::Query<ListInvoicesQuery>,
  use_case: web::Data<Arc<ListInvoicesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let query = query.into_inner();

  let command = ListInvoicesCommand {
    company_id: company_id.into_inner(),
    status: query.status.filter(|s| !s.trim().is_empty()),
    customer_id: query.customer_id,
    search: query.search,
    overdue: query.overdue.unwrap_or(false),
  };

  let response = use_case.execute(command).await?;
  Ok(HttpResponse::Ok().json(response))
}

/// Invoice with line items and payments
/// GET /api/v1/companies/{company_id}/invoices/{invoice_id}
pub async fn get_invoice_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<GetInvoiceDetailsUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (company_id, invoice_id) = path.into_inner();

  let response = use_case
    .execute(GetInvoiceDetailsCommand {
      company_id,
      invoice_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Replace customer, dates, notes and line items of an editable invoice
/// PUT /api/v1/companies/{company_id}/invoices/{invoice_id}
pub async fn update_invoice_handler(
  path: web::Path<(Uuid, Uuid)>,
  request: web::Json<UpdateInvoiceRequest>,
  use_case: web::Data<Arc<UpdateInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;
  let (company_id, invoice_id) = path.into_inner();
  let request = request.into_inner();

  let command = UpdateInvoiceCommand {
    company_id,
    invoice_id,
    customer_id: request.customer_id,
    issue_date: request.issue_date,
    due_date: request.due_date,
    payment_terms: request.payment_terms,
    notes: request.notes,
    line_items: request.line_items.into_iter().map(Into::into).collect(),
  };

  let response = use_case.execute(command).await?;
  Ok(HttpResponse::Ok().json(response))
}

async fn change_status(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<ChangeInvoiceStatusUseCase>>,
  action: StatusAction,
) -> Result<HttpResponse, ApiError> {
  let (company_id, invoice_id) = path.into_inner();

  let response = use_case
    .execute(ChangeInvoiceStatusCommand {
      company_id,
      invoice_id,
      action,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Send (or re-send) an invoice
/// POST /api/v1/companies/{company_id}/invoices/{invoice_id}/send
pub async fn send_invoice_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<ChangeInvoiceStatusUseCase>>,
) -> Result<HttpResponse, ApiError> {
  change_status(path, use_case, StatusAction::Send).await
}

/// Cancel an invoice without payments
/// POST /api/v1/companies/{company_id}/invoices/{invoice_id}/cancel
pub async fn cancel_invoice_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<ChangeInvoiceStatusUseCase>>,
) -> Result<HttpResponse, ApiError> {
  change_status(path, use_case, StatusAction::Cancel).await
}

/// Delete a draft invoice
/// DELETE /api/v1/companies/{company_id}/invoices/{invoice_id}
pub async fn delete_invoice_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<DeleteInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (company_id, invoice_id) = path.into_inner();

  use_case
    .execute(DeleteInvoiceCommand {
      company_id,
      invoice_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(SuccessResponse {
    message: "Invoice deleted".to_string(),
  }))
}

/// Move past-due invoices to overdue
/// POST /api/v1/companies/{company_id}/invoices/overdue-sweep
pub async fn sweep_overdue_handler(
  company_id: web::Path<Uuid>,
  use_case: web::Data<Arc<SweepOverdueUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let command = SweepOverdueCommand {
    company_id: company_id.into_inner(),
    user_id: optional_actor_id(&http_req)?,
  };

  let response = use_case.execute(command).await?;
  Ok(HttpResponse::Ok().json(response))
}

/// Assign structured references to invoices that have none
/// POST /api/v1/companies/{company_id}/invoices/reference-backfill
pub async fn backfill_reference_codes_handler(
  company_id: web::Path<Uuid>,
  use_case: web::Data<Arc<BackfillReferenceCodesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(BackfillReferenceCodesCommand {
      company_id: company_id.into_inner(),
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}
