use actix_web::web;
use std::sync::Arc;

use super::handlers::{
  invoices::{
    backfill_reference_codes_handler, cancel_invoice_handler,
    create_invoice_from_time_entries_handler, create_invoice_handler, delete_invoice_handler,
    get_invoice_handler, list_invoices_handler, send_invoice_handler, sweep_overdue_handler,
    update_invoice_handler,
  },
  payments::record_payment_handler,
  references::{qr_iban_check_handler, validate_reference_handler},
};
use crate::application::invoice::{
  BackfillReferenceCodesUseCase, ChangeInvoiceStatusUseCase, CreateInvoiceFromTimeEntriesUseCase,
  CreateInvoiceUseCase, DeleteInvoiceUseCase, GetInvoiceDetailsUseCase, ListInvoicesUseCase,
  RecordPaymentUseCase, SweepOverdueUseCase, UpdateInvoiceUseCase,
};
use crate::domain::invoice::InvoiceService;

/// Use cases served under `/api/v1/companies/{company_id}/invoices`
#[derive(Clone)]
pub struct InvoiceRouteDependencies {
  pub create_invoice_use_case: Arc<CreateInvoiceUseCase>,
  pub create_from_time_entries_use_case: Arc<CreateInvoiceFromTimeEntriesUseCase>,
  pub list_invoices_use_case: Arc<ListInvoicesUseCase>,
  pub get_invoice_details_use_case: Arc<GetInvoiceDetailsUseCase>,
  pub update_invoice_use_case: Arc<UpdateInvoiceUseCase>,
  pub change_invoice_status_use_case: Arc<ChangeInvoiceStatusUseCase>,
  pub delete_invoice_use_case: Arc<DeleteInvoiceUseCase>,
  pub record_payment_use_case: Arc<RecordPaymentUseCase>,
  pub sweep_overdue_use_case: Arc<SweepOverdueUseCase>,
  pub backfill_reference_codes_use_case: Arc<BackfillReferenceCodesUseCase>,
}

impl InvoiceRouteDependencies {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self {
      create_invoice_use_case: Arc::new(CreateInvoiceUseCase::new(invoice_service.clone())),
      create_from_time_entries_use_case: Arc::new(CreateInvoiceFromTimeEntriesUseCase::new(
        invoice_service.clone(),
      )),
      list_invoices_use_case: Arc::new(ListInvoicesUseCase::new(invoice_service.clone())),
      get_invoice_details_use_case: Arc::new(GetInvoiceDetailsUseCase::new(
        invoice_service.clone(),
      )),
      update_invoice_use_case: Arc::new(UpdateInvoiceUseCase::new(invoice_service.clone())),
      change_invoice_status_use_case: Arc::new(ChangeInvoiceStatusUseCase::new(
        invoice_service.clone(),
      )),
      delete_invoice_use_case: Arc::new(DeleteInvoiceUseCase::new(invoice_service.clone())),
      record_payment_use_case: Arc::new(RecordPaymentUseCase::new(invoice_service.clone())),
      sweep_overdue_use_case: Arc::new(SweepOverdueUseCase::new(invoice_service.clone())),
      backfill_reference_codes_use_case: Arc::new(BackfillReferenceCodesUseCase::new(
        invoice_service,
      )),
    }
  }
}

/// Configure invoice routes; expects to be mounted inside a scope that
/// captures `{company_id}`.
pub fn configure_invoice_routes(cfg: &mut web::ServiceConfig, deps: InvoiceRouteDependencies) {
  cfg
    .app_data(web::Data::new(deps.create_invoice_use_case))
    .app_data(web::Data::new(deps.create_from_time_entries_use_case))
    .app_data(web::Data::new(deps.list_invoices_use_case))
    .app_data(web::Data::new(deps.get_invoice_details_use_case))
    .app_data(web::Data::new(deps.update_invoice_use_case))
    .app_data(web::Data::new(deps.change_invoice_status_use_case))
    .app_data(web::Data::new(deps.delete_invoice_use_case))
    .app_data(web::Data::new(deps.record_payment_use_case))
    .app_data(web::Data::new(deps.sweep_overdue_use_case))
    .app_data(web::Data::new(deps.backfill_reference_codes_use_case))
    .route("", web::post().to(create_invoice_handler))
    .route("", web::get().to(list_invoices_handler))
    .route(
      "/from-time-entries",
      web::post().to(create_invoice_from_time_entries_handler),
    )
    .route("/overdue-sweep", web::post().to(sweep_overdue_handler))
    .route(
      "/reference-backfill",
      web::post().to(backfill_reference_codes_handler),
    )
    .route("/{invoice_id}", web::get().to(get_invoice_handler))
    .route("/{invoice_id}", web::put().to(update_invoice_handler))
    .route("/{invoice_id}", web::delete().to(delete_invoice_handler))
    .route("/{invoice_id}/send", web::post().to(send_invoice_handler))
    .route("/{invoice_id}/cancel", web::post().to(cancel_invoice_handler))
    .route(
      "/{invoice_id}/payments",
      web::post().to(record_payment_handler),
    );
}

/// Stateless reference and IBAN helpers under `/api/v1`
pub fn configure_reference_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route(
      "/references/validate",
      web::post().to(validate_reference_handler),
    )
    .route("/iban/qr-check", web::post().to(qr_iban_check_handler));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::adapters::http::handlers::ACTOR_HEADER;
  use crate::application::invoice::test_support::TestContext;
  use actix_web::http::StatusCode;
  use actix_web::{App, test};
  use serde_json::{Value, json};

  macro_rules! invoice_app {
    ($ctx:expr) => {
      test::init_service(App::new().service(
        web::scope("/api/v1/companies/{company_id}/invoices").configure(|cfg| {
          configure_invoice_routes(cfg, InvoiceRouteDependencies::new($ctx.service.clone()))
        }),
      ))
      .await
    };
  }

  fn invoices_url(ctx: &TestContext) -> String {
    format!("/api/v1/companies/{}/invoices", ctx.company_id)
  }

  #[actix_web::test]
  async fn test_create_send_and_pay_invoice() {
    let ctx = TestContext::new();
    let app = invoice_app!(ctx);

    let req = test::TestRequest::post()
      .uri(&invoices_url(&ctx))
      .insert_header((ACTOR_HEADER, ctx.actor_id.to_string()))
      .set_json(json!({
        "customer_id": ctx.customer_id,
        "issue_date": "2026-01-15",
        "line_items": [
          { "description": "Consulting", "quantity": "2", "unit": "h", "unit_price": "150" }
        ]
      }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["invoice"]["invoice_number"], "RE-2026-001");
    assert_eq!(body["invoice"]["status"], "draft");
    assert_eq!(body["invoice"]["due_date"], "2026-02-14");
    let invoice_id = body["invoice"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
      .uri(&format!("{}/{}/send", invoices_url(&ctx), invoice_id))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "sent");

    // 300 + 8.1% VAT = 324.30
    let req = test::TestRequest::post()
      .uri(&format!("{}/{}/payments", invoices_url(&ctx), invoice_id))
      .set_json(json!({ "amount": "400", "payment_date": "2026-01-20" }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "over_payment");

    let req = test::TestRequest::post()
      .uri(&format!("{}/{}/payments", invoices_url(&ctx), invoice_id))
      .set_json(json!({ "amount": "324.30", "payment_date": "2026-01-20" }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["invoice_status"], "paid");
    assert_eq!(body["payment"]["payment_number"], "ZE-2026-00001");

    let req = test::TestRequest::delete()
      .uri(&format!("{}/{}", invoices_url(&ctx), invoice_id))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[actix_web::test]
  async fn test_create_requires_actor_and_line_items() {
    let ctx = TestContext::new();
    let app = invoice_app!(ctx);

    let payload = json!({
      "customer_id": ctx.customer_id,
      "issue_date": "2026-01-15",
      "line_items": [{ "description": "Consulting", "quantity": "1", "unit_price": "100" }]
    });
    let req = test::TestRequest::post()
      .uri(&invoices_url(&ctx))
      .set_json(&payload)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
      .uri(&invoices_url(&ctx))
      .insert_header((ACTOR_HEADER, ctx.actor_id.to_string()))
      .set_json(json!({
        "customer_id": ctx.customer_id,
        "issue_date": "2026-01-15",
        "line_items": []
      }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[actix_web::test]
  async fn test_get_and_list_invoices() {
    let ctx = TestContext::new();
    let invoice = ctx.create_invoice().await;
    let app = invoice_app!(ctx);

    let req = test::TestRequest::get()
      .uri(&format!("{}/{}", invoices_url(&ctx), invoice.id))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["line_items"].as_array().unwrap().len(), 1);
    assert!(body["payments"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
      .uri(&format!("{}?status=draft", invoices_url(&ctx)))
      .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["invoices"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
      .uri(&format!("{}/{}", invoices_url(&ctx), uuid::Uuid::new_v4()))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[actix_web::test]
  async fn test_reference_helpers() {
    let app = test::init_service(
      App::new().service(web::scope("/api/v1").configure(configure_reference_routes)),
    )
    .await;

    let req = test::TestRequest::post()
      .uri("/api/v1/references/validate")
      .set_json(json!({ "reference": "00 00000 00000 00000 00000 01562" }))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["formatted"], "00 00000 00000 00000 00000 01562");

    let req = test::TestRequest::post()
      .uri("/api/v1/references/validate")
      .set_json(json!({ "reference": "000000000000000000000001563" }))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["valid"], false);
    assert!(body.get("formatted").is_none());

    let req = test::TestRequest::post()
      .uri("/api/v1/iban/qr-check")
      .set_json(json!({ "iban": "CH44 3199 9123 0008 8901 2" }))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["qr_iban"], true);
  }
}
