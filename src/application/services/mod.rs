//! Business logic services for the application layer.

pub mod relay_service;

pub use relay_service::RelayService;
