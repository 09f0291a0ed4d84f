pub mod calculator;
pub mod entities;
pub mod errors;
pub mod lifecycle;
pub mod numbering;
pub mod ports;
pub mod reference;
pub mod services;
pub mod time_entries;
pub mod value_objects;

pub use calculator::{InvoiceTotals, LineItemInput};
pub use entities::{
  Customer, Invoice, InvoiceDraft, InvoiceLineItem, Payment, PaymentDraft, PaymentProgress,
};
pub use errors::{ErrorKind, InvoiceError};
pub use numbering::SequenceKind;
pub use ports::{
  AuditRecord, CustomerRepository, ExpectedState, InvoiceFilter, InvoiceLineItemRepository,
  InvoiceRepository, Notification, NotificationSink, PaymentRepository, Severity, SweepAudit,
  TimeEntryRepository,
};
pub use reference::ReferenceCode;
pub use services::{
  InvoiceData, InvoiceDetails, InvoiceService, InvoiceServiceDependencies, InvoiceUpdateData,
  InvoicingSettings, PaymentData, SweepOutcome, TimeEntryInvoiceData,
};
pub use time_entries::TimeEntry;
pub use value_objects::{
  DiscountPercent, InvoiceNumber, InvoiceStatus, LineItemDescription, Money, PaymentNumber,
  PaymentTerms, Quantity, ValueObjectError, VatRate,
};
