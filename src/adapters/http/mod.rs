pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod routes;

// Re-export commonly used types
pub use dtos::{ErrorResponse, SuccessResponse};
pub use errors::ApiError;
pub use handlers::ACTOR_HEADER;
pub use routes::{InvoiceRouteDependencies, configure_invoice_routes, configure_reference_routes};
