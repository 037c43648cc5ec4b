//! # Attribution Relay
//!
//! A small fan-out service that forwards advertising attribution to a set
//! of partner tracking URLs, built with Axum and reqwest.
//!
//! ## How It Works
//!
//! A visitor lands with query parameters like `gclid` and `utm_source`.
//! The relay captures them once, merges them into every configured target
//! URL without overwriting parameters the targets already carry, picks a
//! Referer per target from the configured policy, and fires all targets
//! concurrently in the background. The visitor's response never waits on
//! a target and never changes when one is slow or down.
//!
//! Hits arrive two ways: an explicit `GET|POST /track` (answered with an
//! immediate 204) or implicitly when a landing page is viewed.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Attribution extraction, target
//!   merging, referer policy, dispatch contract
//! - **Application Layer** ([`application`]) - Hit planning and concurrent
//!   dispatch orchestration
//! - **Infrastructure Layer** ([`infrastructure`]) - Outbound HTTP delivery
//! - **API Layer** ([`api`]) - Handlers, middleware, and routes
//!
//! ## Quick Start
//!
//! ```bash
//! export TARGET_URLS="https://partner-a.example/offer,https://partner-b.example/c/abc"
//! export TARGET_REFERERS="https://your.site/landing"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via
//! [`config::Config`]. See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;

pub mod config;
pub mod server;

pub mod routes;

pub use error::RelayError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::RelayService;
    pub use crate::config::{Config, RedirectRule};
    pub use crate::domain::attribution::AttributionRecord;
    pub use crate::domain::dispatch::{DispatchJob, DispatchSummary, Forwarder};
    pub use crate::domain::referer::RefererConfig;
    pub use crate::domain::targets::TargetList;
    pub use crate::error::RelayError;
    pub use crate::state::AppState;
}
