mod audit_log;
pub mod customer_repository;
pub mod invoice_line_item_repository;
pub mod invoice_repository;
pub mod payment_repository;
mod sequences;
pub mod time_entry_repository;

pub use customer_repository::PostgresCustomerRepository;
pub use invoice_line_item_repository::PostgresInvoiceLineItemRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use time_entry_repository::PostgresTimeEntryRepository;
