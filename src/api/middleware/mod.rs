//! HTTP middleware for request processing and protection.
//!
//! Provides the implicit landing trigger, local redirects, rate limiting,
//! and observability middleware.

pub mod rate_limit;
pub mod redirects;
pub mod tracing;
pub mod trigger;
