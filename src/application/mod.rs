//! Application layer orchestrating the relay pipeline.
//!
//! This layer wires the pure domain logic together: it plans the dispatch
//! batch for an inbound hit and fires it through a
//! [`crate::domain::dispatch::Forwarder`] without blocking the caller.
//!
//! # Available Services
//!
//! - [`services::relay_service::RelayService`] - Hit planning and concurrent dispatch

pub mod services;
