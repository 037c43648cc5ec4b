//! Dispatch contract between the relay pipeline and the HTTP transport.
//!
//! The application layer plans a batch of [`DispatchJob`]s and hands each
//! one to a [`Forwarder`]. The trait boundary keeps the fan-out logic
//! testable without a network.

use async_trait::async_trait;
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::error::RelayError;

/// One forwarded hit: the fully merged target URL plus the Referer value
/// chosen for it. `referer: None` means the request carries no Referer
/// header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchJob {
    /// Position of the target in the configured list.
    pub target_index: usize,
    pub url: Url,
    pub referer: Option<String>,
}

/// Result of one dispatch attempt, tagged with the target it went to.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub target: String,
    pub result: Result<u16, RelayError>,
}

impl DispatchOutcome {
    pub fn delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate counts for one fired batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        let delivered = outcomes.iter().filter(|o| o.delivered()).count();
        Self {
            attempted: outcomes.len(),
            delivered,
            failed: outcomes.len() - delivered,
        }
    }
}

/// Sends a single planned hit to its target.
///
/// Implementations issue a GET without following redirects and report the
/// upstream status. A 2xx or 3xx answer is a delivery; 4xx and 5xx come
/// back as [`RelayError::UpstreamStatus`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, job: DispatchJob) -> Result<u16, RelayError>;
}
