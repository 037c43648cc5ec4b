//! Domain layer containing the relay's core logic.
//!
//! Everything here is pure: no I/O, no clocks, no HTTP. The modules parse the
//! inbound query, resolve the configured target list, pick a referer per
//! target, and describe dispatch jobs. Actual network delivery lives behind
//! the [`dispatch::Forwarder`] trait, implemented in the infrastructure layer.
//!
//! # Architecture
//!
//! - [`attribution`] - Inbound query parameter extraction
//! - [`targets`] - Target list parsing and attribution merging
//! - [`referer`] - Referer policy shapes and per-target resolution
//! - [`dispatch`] - Forwarder contract, job and outcome types
//!
//! # Relay Flow
//!
//! 1. HTTP handler receives a `/track` hit (or a landing-page view)
//! 2. [`attribution::AttributionRecord`] is collected from the query string
//! 3. [`targets::TargetList::resolve`] merges attribution into each target URL
//! 4. [`crate::application::services::RelayService`] fires the batch through
//!    a [`dispatch::Forwarder`] without blocking the response

pub mod attribution;
pub mod dispatch;
pub mod referer;
pub mod targets;
