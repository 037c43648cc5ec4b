//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer. Today that
//! is a single concern: delivering planned hits over HTTP.
//!
//! # Modules
//!
//! - [`forwarder`] - HTTP implementation of the dispatch contract

pub mod forwarder;
