//! Outbound HTTP delivery.

pub mod http_forwarder;

pub use http_forwarder::HttpForwarder;
