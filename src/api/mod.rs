//! HTTP layer for the relay.
//!
//! This layer translates HTTP requests into relay operations and keeps the
//! visitor-facing response contract independent of dispatch outcomes.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for response serialization
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Landing triggers, redirects, rate limiting, tracing
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
