pub mod backfill_reference_codes;
pub mod change_invoice_status;
pub mod create_invoice;
pub mod create_invoice_from_time_entries;
pub mod delete_invoice;
pub mod dto;
pub mod get_invoice_details;
pub mod list_invoices;
pub mod record_payment;
pub mod sweep_overdue;
pub mod update_invoice;

pub use backfill_reference_codes::{
  BackfillReferenceCodesCommand, BackfillReferenceCodesResponse, BackfillReferenceCodesUseCase,
};
pub use change_invoice_status::{
  ChangeInvoiceStatusCommand, ChangeInvoiceStatusResponse, ChangeInvoiceStatusUseCase,
  StatusAction,
};
pub use create_invoice::{CreateInvoiceCommand, CreateInvoiceResponse, CreateInvoiceUseCase};
pub use create_invoice_from_time_entries::{
  CreateInvoiceFromTimeEntriesCommand, CreateInvoiceFromTimeEntriesUseCase,
};
pub use delete_invoice::{DeleteInvoiceCommand, DeleteInvoiceUseCase};
pub use dto::{
  InvoiceDto, InvoiceLineItemDto, InvoiceWithLineItemsResponse, LineItemCommand, PaymentDto,
};
pub use get_invoice_details::{
  GetInvoiceDetailsCommand, GetInvoiceDetailsUseCase, InvoiceDetailsResponse,
};
pub use list_invoices::{
  InvoiceListItemDto, ListInvoicesCommand, ListInvoicesResponse, ListInvoicesUseCase,
};
pub use record_payment::{RecordPaymentCommand, RecordPaymentResponse, RecordPaymentUseCase};
pub use sweep_overdue::{SweepOverdueCommand, SweepOverdueResponse, SweepOverdueUseCase};
pub use update_invoice::{UpdateInvoiceCommand, UpdateInvoiceUseCase};
