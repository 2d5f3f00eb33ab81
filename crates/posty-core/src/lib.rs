//! # Posty Core
//!
//! The domain layer of the Posty blog: entities, pagination and the ports
//! that infrastructure adapters implement.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
