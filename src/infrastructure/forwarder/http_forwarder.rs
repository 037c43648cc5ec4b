//! HTTP implementation of the dispatch contract.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};

use crate::domain::dispatch::{DispatchJob, Forwarder};
use crate::error::RelayError;

/// Delivers hits with a pooled reqwest client.
///
/// Redirect following is disabled: a 3xx answer already proves the target
/// received the hit, and chasing affiliate redirect chains from the relay
/// would distort attribution on the far side.
pub struct HttpForwarder {
    client: Client,
}

impl HttpForwarder {
    /// Builds the forwarder. `connect_timeout` bounds connection
    /// establishment only; the per-attempt deadline is enforced by the
    /// caller around the whole request.
    pub fn new(connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(connect_timeout)
            .redirect(Policy::none())
            .user_agent(concat!("attribution-relay/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, job: DispatchJob) -> Result<u16, RelayError> {
        let mut request = self.client.get(job.url.clone());
        if let Some(referer) = &job.referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|source| RelayError::Unreachable {
                target: job.url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(RelayError::UpstreamStatus {
                target: job.url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(status.as_u16())
    }
}
