//! Invoicing for Swiss businesses: invoice lifecycle, QR payment references,
//! VAT calculation, document numbering and the payment ledger.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
