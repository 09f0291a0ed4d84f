//! Application layer
//!
//! Use cases translate client commands into calls on the domain services and
//! shape the results into response DTOs.

pub mod invoice;
