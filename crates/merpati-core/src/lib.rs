//! # Merpati Core
//!
//! The domain layer of the KataMerpati blogging backend.
//! Entities, validation rules, ports and the application services live here,
//! with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
