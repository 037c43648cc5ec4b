//! Error taxonomy for the relay pipeline.
//!
//! None of these errors ever reach the visitor: configuration-shape problems
//! degrade to the most permissive interpretation, malformed target entries
//! are skipped, and per-target dispatch failures are logged and absorbed.
//! The visitor-facing response contract is fixed regardless of what happens
//! inside the pipeline.

use thiserror::Error;

/// Errors produced while resolving configuration or dispatching to targets.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A configured value could not be interpreted as any recognized shape.
    ///
    /// Handled by falling back to the most permissive reading (absent
    /// referer configuration, skipped target entry) rather than failing the
    /// request.
    #[error("unrecognized configuration shape: {reason}")]
    ConfigShape { reason: String },

    /// A configured target string is not a parseable URL.
    ///
    /// The entry is excluded from the resolved set; sibling entries are
    /// unaffected.
    #[error("invalid target URL '{url}': {source}")]
    MalformedTargetUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A dispatch attempt failed at the transport level.
    #[error("request to {target} failed: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    /// A dispatch attempt exceeded its per-attempt deadline and was
    /// cancelled. Siblings in the same batch keep running.
    #[error("request to {target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u64 },

    /// The target answered with a client or server error status.
    ///
    /// Redirect statuses are not errors here: with redirect-following
    /// disabled, a 3xx still proves the target received the hit.
    #[error("target {target} answered with status {status}")]
    UpstreamStatus { target: String, status: u16 },
}

impl RelayError {
    /// Short label used for log fields and metric dimensions.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigShape { .. } => "config_shape",
            Self::MalformedTargetUrl { .. } => "malformed_target",
            Self::Unreachable { .. } => "unreachable",
            Self::Timeout { .. } => "timeout",
            Self::UpstreamStatus { .. } => "upstream_status",
        }
    }
}
